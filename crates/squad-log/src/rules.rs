//! The ordered rule catalog: one precompiled regex per rule, evaluated
//! first-match-wins, each paired with a mapping function that may
//! read/write the correlation store and produce zero or more events.
//!
//! `round-tickets` is the one rule whose mapping function can produce more
//! than one event: the game log carries the winner/loser/ticket facts for
//! a finished round across the *same* physical line shape, so a single
//! regex drives `ROUND_TICKETS` always, plus `ROUND_WINNER`/`ROUND_ENDED`
//! once both sides of the round have been observed. This fuses the three
//! catalog-named event kinds into the rule the wire format actually
//! supports, rather than three independent (and mutually-shadowing) regexes
//! for the same line.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use squad_core::{ChainId, Event, IdError, Player, PlayerController, RoundSide, TeamId};

use crate::store::{CombatSession, EventStore, JoinRequest, LastDamage};

/// Parses an `Online IDs:...` capture into `(eosID, steamID?)`. A literal
/// `INVALID` sentinel anywhere in the substring aborts the parse.
static ONLINE_IDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"EOS:\s*([0-9a-fA-F]{32})(?:\s+steam:\s*(\d+))?").expect("valid regex"));

pub fn parse_online_ids(raw: &str) -> Option<(squad_core::EosId, Option<String>)> {
    if raw.contains("INVALID") {
        return None;
    }
    let caps = ONLINE_IDS.captures(raw)?;
    let eos_id = squad_core::EosId::new(&caps[1]).ok()?;
    let steam_id = caps.get(2).map(|m| m.as_str().to_string());
    Some((eos_id, steam_id))
}

fn controller_or_raw(raw: &str) -> Result<PlayerController, IdError> {
    PlayerController::new(raw)
}

/// One entry in the ordered catalog. `apply` receives the line's chain id
/// (parsed once from the standard prefix, ahead of rule matching) alongside
/// the rule's own captures — the two correlation-sensitive rules
/// (`player-connected`, `player-join-succeeded`) need it to key the join
/// request table; every other rule ignores it.
pub struct Rule {
    pub name: &'static str,
    pub event_name: &'static str,
    pub regex: &'static Lazy<Regex>,
    pub apply: fn(&Captures, DateTime<Utc>, ChainId, &str, &mut EventStore) -> Vec<Event>,
}

static PLAYER_CONNECTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogSquad: PostLogin: NewPlayer: (?:BP_)?PlayerController(?:\|.+)_C .+PersistentLevel\.([^\s]+)",
        r" \(IP: ([\d.]+) \| Online IDs:([^)\|]+)\)",
    ))
    .expect("valid regex")
});

static PLAYER_JOIN_SUCCEEDED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LogNet: Join succeeded: (.+)").expect("valid regex"));

static PLAYER_DISCONNECTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogNet: UChannel::Close: Sending CloseBunch\..+RemoteAddr: ([\d.]+).+",
        r"PC: (\w+PlayerController(?:\|.+)_C_\d+),.+UniqueId: RedpointEOS:([0-9a-f]+)",
    ))
    .expect("valid regex")
});

static PLAYER_POSSESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"LogSquadTrace: \[DedicatedServer\]ASQPlayerController::OnPossess\(\): PC=(.+) Pawn=(.+)")
        .expect("valid regex")
});

static PLAYER_UNPOSSESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"LogSquadTrace: \[DedicatedServer\]ASQPlayerController::OnUnPossess\(\): PC=(.+) Pawn=(.+)")
        .expect("valid regex")
});

static PLAYER_DAMAGED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogSquad: Player:(.+) ActualDamage=([0-9.]+) from (.+) \(Online IDs:([^\|]+)\|",
        r" Player Controller ID: ([^ ]+)\)caused by ([A-Za-z_0-9-]+)_C",
    ))
    .expect("valid regex")
});

static PLAYER_WOUNDED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogSquadTrace: \[DedicatedServer\](?:ASQSoldier::)?Wound\(\): Player:(.+) KillingDamage=(?:-)*([0-9.]+)",
        r" from ([A-Za-z_0-9]+) \(Online IDs:([^)\|]+)\| Contoller ID: ([\w\d]+)\) caused by ([A-Za-z_0-9-]+)_C",
    ))
    .expect("valid regex")
});

static PLAYER_DIED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogSquadTrace: \[DedicatedServer\](?:ASQSoldier::)?Die\(\): Player:(.+) KillingDamage=(?:-)*([0-9.]+)",
        r" from ([A-Za-z_0-9]+) \(Online IDs:([^)\|]+)\| Contoller ID: ([\w\d]+)\) caused by ([A-Za-z_0-9-]+)_C",
    ))
    .expect("valid regex")
});

static PLAYER_REVIVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LogSquad: Player:(.+) has revived Player:(.+)\.").expect("valid regex"));

static DEPLOYABLE_DAMAGED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogSquadTrace: \[DedicatedServer\](?:ASQDeployable::)?TakeDamage\(\): ([A-Za-z0-9_]+)_C_[0-9]+:",
        r" ([0-9.]+) damage attempt by causer ([A-Za-z0-9_]+)_C_[0-9]+ instigator (.+) with damage type",
        r" ([A-Za-z0-9_]+)_C health remaining ([0-9.]+)",
    ))
    .expect("valid regex")
});

static NEW_GAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"LogWorld: Bringing World /([A-Za-z0-9]+)/(?:Maps/)?([A-Za-z0-9-]+)/(?:.+/)?([A-Za-z0-9-]+)(?:\.[A-Za-z0-9-]+)")
        .expect("valid regex")
});

static ROUND_TICKETS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"LogSquadGameEvents: Display: Team ([0-9]), (.*) \( ?(.*?) ?\) has (won|lost) the match with",
        r" ([0-9]+) Tickets on layer (.*) \(level (.*)\)!",
    ))
    .expect("valid regex")
});

static SERVER_TICK_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LogSquad: USQGameState: Server Tick Rate: ([0-9.]+)").expect("valid regex"));

static ADMIN_BROADCAST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LogSquad: ADMIN COMMAND: Message broadcasted <(.+)> from (.+)").expect("valid regex"));

fn player_connected(caps: &Captures, time: DateTime<Utc>, chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let Ok(controller) = controller_or_raw(&caps[1]) else {
        return Vec::new();
    };
    let ip = caps[2].to_string();
    let Some((eos_id, steam_id)) = parse_online_ids(&caps[3]) else {
        return Vec::new();
    };

    let mut player = Player::new(eos_id.clone());
    player.steam_id = steam_id.clone();
    player.controller = Some(controller.clone());
    player.ip = Some(ip.clone());
    store.disconnected.remove(&eos_id);
    store.upsert_player(player.clone());
    store.join_requests.insert(chain_id, JoinRequest { player, ip: ip.clone(), chain_id });

    vec![Event::PlayerConnected {
        time,
        raw: raw.to_string(),
        chain_id,
        controller: controller.to_string(),
        ip,
        eos_id,
        steam_id,
    }]
}

/// Suppresses the event (returns no event) if no matching `player-connected`
/// request is pending for this chain id — a late or stray line.
fn player_join_succeeded(caps: &Captures, time: DateTime<Utc>, chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let name = caps[1].to_string();
    let Some(request) = store.join_requests.remove(&chain_id) else {
        return Vec::new();
    };

    let mut player = request.player;
    player.name = Some(name.clone());
    let eos_id = player.eos_id.clone();
    store.upsert_player(player);

    vec![Event::PlayerJoinSucceeded {
        time,
        raw: raw.to_string(),
        chain_id,
        eos_id,
        name,
    }]
}

fn player_possess(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, _store: &mut EventStore) -> Vec<Event> {
    vec![Event::PlayerPossess {
        time,
        raw: raw.to_string(),
        controller: caps[1].to_string(),
        pawn: caps[2].to_string(),
    }]
}

fn player_unpossess(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, _store: &mut EventStore) -> Vec<Event> {
    vec![Event::PlayerUnpossess {
        time,
        raw: raw.to_string(),
        controller: caps[1].to_string(),
        pawn: caps[2].to_string(),
    }]
}

fn player_damaged(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let victim_name = caps[1].to_string();
    let Ok(damage) = caps[2].parse::<f64>() else {
        return Vec::new();
    };
    let attacker_name = caps[3].to_string();
    let Some((attacker_eos_id, attacker_steam_id)) = parse_online_ids(&caps[4]) else {
        return Vec::new();
    };
    let attacker_controller = caps[5].to_string();
    let weapon = caps[6].to_string();

    if let Some(player) = store.players.get_mut(&attacker_eos_id) {
        player.controller = PlayerController::new(&attacker_controller).ok().or(player.controller.clone());
    }

    store.sessions.insert(
        victim_name.clone(),
        CombatSession {
            chain_id: None,
            last_damage: LastDamage {
                damage,
                weapon: weapon.clone(),
                attacker_name: attacker_name.clone(),
                attacker_eos_id: attacker_eos_id.clone(),
                attacker_steam_id: attacker_steam_id.clone(),
                attacker_controller: attacker_controller.clone(),
            },
        },
    );

    vec![Event::PlayerDamaged {
        time,
        raw: raw.to_string(),
        victim_name,
        damage,
        weapon,
        attacker_name,
        attacker_eos_id,
        attacker_steam_id,
        attacker_controller,
    }]
}

fn player_wounded(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let victim_name = caps[1].to_string();
    let Ok(killing_damage) = caps[2].parse::<f64>() else {
        return Vec::new();
    };
    let line_attacker_name = caps[3].to_string();
    let Some((line_attacker_eos_id, line_attacker_steam_id)) = parse_online_ids(&caps[4]) else {
        return Vec::new();
    };
    let line_attacker_controller = caps[5].to_string();
    let weapon = caps[6].to_string();

    // The wound line's own "from"/controller capture is the instigating
    // pawn, not necessarily the player that actually damaged the victim;
    // prefer the attacker correlated by a prior player-damaged line when
    // one exists, falling back to the line's own capture otherwise.
    let (attacker_name, attacker_eos_id, attacker_steam_id, attacker_controller) = match store.sessions.get(&victim_name) {
        Some(session) => (
            session.last_damage.attacker_name.clone(),
            session.last_damage.attacker_eos_id.clone(),
            session.last_damage.attacker_steam_id.clone(),
            session.last_damage.attacker_controller.clone(),
        ),
        None => (line_attacker_name, line_attacker_eos_id, line_attacker_steam_id, line_attacker_controller),
    };

    store.sessions.insert(
        victim_name.clone(),
        CombatSession {
            chain_id: None,
            last_damage: LastDamage {
                damage: killing_damage,
                weapon: weapon.clone(),
                attacker_name: attacker_name.clone(),
                attacker_eos_id: attacker_eos_id.clone(),
                attacker_steam_id: attacker_steam_id.clone(),
                attacker_controller: attacker_controller.clone(),
            },
        },
    );

    vec![Event::PlayerWounded {
        time,
        raw: raw.to_string(),
        victim_name,
        killing_damage,
        attacker_name,
        attacker_eos_id,
        attacker_steam_id,
        attacker_controller,
        weapon,
    }]
}

fn player_died(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let victim_name = caps[1].to_string();
    let Ok(killing_damage) = caps[2].parse::<f64>() else {
        return Vec::new();
    };
    let line_attacker_name = caps[3].to_string();
    let Some((line_attacker_eos_id, line_attacker_steam_id)) = parse_online_ids(&caps[4]) else {
        return Vec::new();
    };
    let line_attacker_controller = caps[5].to_string();
    let weapon = caps[6].to_string();

    // As in player_wounded: the Die() line's own "from"/controller capture
    // names the instigating pawn, not the player a prior damage line already
    // correlated as the real attacker. Prefer the correlated session.
    let session = store.sessions.remove(&victim_name);
    let (attacker_name, attacker_eos_id, attacker_steam_id, attacker_controller) = match &session {
        Some(session) => (
            session.last_damage.attacker_name.clone(),
            session.last_damage.attacker_eos_id.clone(),
            session.last_damage.attacker_steam_id.clone(),
            session.last_damage.attacker_controller.clone(),
        ),
        None => (line_attacker_name, line_attacker_eos_id, line_attacker_steam_id, line_attacker_controller),
    };

    let suicide = victim_name == attacker_name;

    vec![Event::PlayerDied {
        time,
        raw: raw.to_string(),
        victim_name,
        killing_damage,
        attacker_name,
        attacker_eos_id,
        attacker_steam_id,
        attacker_controller,
        weapon,
        suicide,
    }]
}

fn player_revived(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let reviver_name = caps[1].to_string();
    let victim_name = caps[2].to_string();
    store.sessions.remove(&victim_name);

    vec![Event::PlayerRevived {
        time,
        raw: raw.to_string(),
        reviver_name,
        victim_name,
    }]
}

fn deployable_damaged(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, _store: &mut EventStore) -> Vec<Event> {
    let deployable = caps[1].to_string();
    let Ok(damage) = caps[2].parse::<f64>() else {
        return Vec::new();
    };
    let _causer = caps[3].to_string();
    let instigator = caps[4].to_string();
    let weapon = caps[5].to_string();
    let Ok(health_remaining) = caps[6].parse::<f64>() else {
        return Vec::new();
    };

    vec![Event::DeployableDamaged {
        time,
        raw: raw.to_string(),
        deployable,
        damage,
        weapon,
        instigator,
        health_remaining,
    }]
}

fn new_game(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let level = caps[2].to_string();
    let layer_name = caps[3].to_string();
    if layer_name == "TransitionMap" {
        return Vec::new();
    }

    store.clear_on_new_game();

    vec![Event::NewGame {
        time,
        raw: raw.to_string(),
        level,
        layer_name,
        // The source hardcodes false; no line in this grammar distinguishes
        // a cold-start first map from a later rotation.
        is_first_game: false,
    }]
}

fn round_tickets(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let Some(team_id) = caps[1].parse::<u8>().ok().and_then(|v| TeamId::new(v).ok()) else {
        return Vec::new();
    };
    let faction = caps[2].trim().to_string();
    let faction_short = caps[3].trim().to_string();
    let won = &caps[4] == "won";
    let Ok(tickets) = caps[5].parse::<i64>() else {
        return Vec::new();
    };
    let layer = caps[6].to_string();
    let level = caps[7].to_string();

    let side = RoundSide {
        team_id,
        faction: faction.clone(),
        tickets,
    };

    let mut events = vec![Event::RoundTickets {
        time,
        raw: raw.to_string(),
        team_id,
        faction,
        faction_short,
        tickets,
        won,
        layer: layer.clone(),
        level: level.clone(),
    }];

    store.round_result.layer = Some(layer.clone());
    store.round_result.level = Some(level.clone());
    if won {
        store.round_result.winner = Some(side.clone());
        events.push(Event::RoundWinner {
            time,
            raw: raw.to_string(),
            team_id,
            faction: side.faction.clone(),
            tickets,
            layer: layer.clone(),
            level: level.clone(),
        });
    } else {
        store.round_result.loser = Some(side);
    }

    if let (Some(winner), Some(loser)) = (&store.round_result.winner, &store.round_result.loser) {
        events.push(Event::RoundEnded {
            time,
            raw: raw.to_string(),
            winner: Some(winner.clone()),
            loser: Some(loser.clone()),
            layer,
            level,
        });
    }

    events
}

fn server_tick_rate(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, _store: &mut EventStore) -> Vec<Event> {
    let Ok(tick_rate) = caps[1].parse::<f64>() else {
        return Vec::new();
    };
    vec![Event::ServerTickRate {
        time,
        raw: raw.to_string(),
        tick_rate,
    }]
}

fn admin_broadcast(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, _store: &mut EventStore) -> Vec<Event> {
    vec![Event::AdminBroadcast {
        time,
        raw: raw.to_string(),
        message: caps[1].to_string(),
        from: caps[2].to_string(),
    }]
}

/// The fixed, ordered rule catalog, evaluated first-match-wins by the
/// engine. `player-connected` and `player-join-succeeded` use the chain id
/// the engine parses from the line's standard prefix to correlate the join
/// request; every other rule ignores it.
pub fn rules() -> &'static [Rule] {
    static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
        vec![
            Rule {
                name: "player-connected",
                event_name: "PLAYER_CONNECTED",
                regex: &PLAYER_CONNECTED_RE,
                apply: player_connected,
            },
            Rule {
                name: "player-disconnected",
                event_name: "PLAYER_DISCONNECTED",
                regex: &PLAYER_DISCONNECTED_RE,
                apply: player_disconnected,
            },
            Rule {
                name: "player-join-succeeded",
                event_name: "PLAYER_JOIN_SUCCEEDED",
                regex: &PLAYER_JOIN_SUCCEEDED_RE,
                apply: player_join_succeeded,
            },
            Rule {
                name: "player-possess",
                event_name: "PLAYER_POSSESS",
                regex: &PLAYER_POSSESS_RE,
                apply: player_possess,
            },
            Rule {
                name: "player-unpossess",
                event_name: "PLAYER_UNPOSSESS",
                regex: &PLAYER_UNPOSSESS_RE,
                apply: player_unpossess,
            },
            Rule {
                name: "player-wounded",
                event_name: "PLAYER_WOUNDED",
                regex: &PLAYER_WOUNDED_RE,
                apply: player_wounded,
            },
            Rule {
                name: "player-died",
                event_name: "PLAYER_DIED",
                regex: &PLAYER_DIED_RE,
                apply: player_died,
            },
            Rule {
                name: "player-revived",
                event_name: "PLAYER_REVIVED",
                regex: &PLAYER_REVIVED_RE,
                apply: player_revived,
            },
            Rule {
                name: "player-damaged",
                event_name: "PLAYER_DAMAGED",
                regex: &PLAYER_DAMAGED_RE,
                apply: player_damaged,
            },
            Rule {
                name: "deployable-damaged",
                event_name: "DEPLOYABLE_DAMAGED",
                regex: &DEPLOYABLE_DAMAGED_RE,
                apply: deployable_damaged,
            },
            Rule {
                name: "new-game",
                event_name: "NEW_GAME",
                regex: &NEW_GAME_RE,
                apply: new_game,
            },
            Rule {
                name: "round-tickets",
                event_name: "ROUND_TICKETS",
                regex: &ROUND_TICKETS_RE,
                apply: round_tickets,
            },
            Rule {
                name: "server-tick-rate",
                event_name: "SERVER_TICK_RATE",
                regex: &SERVER_TICK_RATE_RE,
                apply: server_tick_rate,
            },
            Rule {
                name: "admin-broadcast",
                event_name: "ADMIN_BROADCAST",
                regex: &ADMIN_BROADCAST_RE,
                apply: admin_broadcast,
            },
        ]
    });
    &RULES
}

fn player_disconnected(caps: &Captures, time: DateTime<Utc>, _chain_id: ChainId, raw: &str, store: &mut EventStore) -> Vec<Event> {
    let ip = caps[1].to_string();
    let controller = caps[2].to_string();
    let Ok(eos_id) = squad_core::EosId::new(&caps[3]) else {
        return Vec::new();
    };

    store.disconnected.insert(eos_id.clone(), ());

    vec![Event::PlayerDisconnected {
        time,
        raw: raw.to_string(),
        ip,
        controller,
        eos_id,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_online_ids_with_steam() {
        let (eos, steam) = parse_online_ids(" EOS: 0123456789abcdef0123456789abcdef steam: 76561198000000000").unwrap();
        assert_eq!(eos.as_str(), "0123456789abcdef0123456789abcdef");
        assert_eq!(steam, Some("76561198000000000".to_string()));
    }

    #[test]
    fn online_ids_invalid_sentinel_aborts() {
        assert!(parse_online_ids("EOS:INVALID").is_none());
    }

    #[test]
    fn new_game_rule_matches_sample_line() {
        let line = "LogWorld: Bringing World /Game/Maps/Narva/Narva_Invasion_v1.Narva_Invasion_v1";
        let caps = NEW_GAME_RE.captures(line).unwrap();
        let mut store = EventStore::new();
        let events = new_game(&caps, Utc::now(), ChainId(1), line, &mut store);
        match &events[0] {
            Event::NewGame { level, layer_name, is_first_game, .. } => {
                assert_eq!(level, "Narva");
                assert_eq!(layer_name, "Narva_Invasion_v1");
                assert!(!is_first_game);
            }
            _ => panic!("expected NewGame"),
        }
    }

    #[test]
    fn new_game_skips_transition_map() {
        let line = "LogWorld: Bringing World /Game/Maps/TransitionMap/TransitionMap.TransitionMap";
        let caps = NEW_GAME_RE.captures(line).unwrap();
        let mut store = EventStore::new();
        assert!(new_game(&caps, Utc::now(), ChainId(1), line, &mut store).is_empty());
    }

    #[test]
    fn round_tickets_emits_winner_and_ended_once_both_sides_seen() {
        let lost_line =
            "LogSquadGameEvents: Display: Team 1, Irregular Forces ( INS ) has lost the match with 10 Tickets on layer Narva_Insurgency_v1 (level Narva)!";
        let won_line =
            "LogSquadGameEvents: Display: Team 2, Regular Forces ( US ) has won the match with 50 Tickets on layer Narva_Insurgency_v1 (level Narva)!";

        let mut store = EventStore::new();
        let caps1 = ROUND_TICKETS_RE.captures(lost_line).unwrap();
        let first = round_tickets(&caps1, Utc::now(), ChainId(1), lost_line, &mut store);
        assert_eq!(first.len(), 1); // just ROUND_TICKETS; no winner yet

        let caps2 = ROUND_TICKETS_RE.captures(won_line).unwrap();
        let second = round_tickets(&caps2, Utc::now(), ChainId(1), won_line, &mut store);
        assert_eq!(second.len(), 3); // ROUND_TICKETS + ROUND_WINNER + ROUND_ENDED
    }

    #[test]
    fn died_detects_suicide_when_attacker_matches_victim() {
        let line = "LogSquadTrace: [DedicatedServer]ASQSoldier::Die(): Player:Bob KillingDamage=100 from Bob (Online IDs:EOS:0123456789abcdef0123456789abcdef| Contoller ID: ctrlA) caused by BP_Frag_C";
        let caps = PLAYER_DIED_RE.captures(line).unwrap();
        let mut store = EventStore::new();
        let events = player_died(&caps, Utc::now(), ChainId(1), line, &mut store);
        match &events[0] {
            Event::PlayerDied { suicide, .. } => assert!(suicide),
            _ => panic!("expected PlayerDied"),
        }
    }

    #[test]
    fn died_attacker_fields_come_from_correlated_damage_session() {
        let damaged_line = "LogSquad: Player:Bob ActualDamage=40.0 from Alice (Online IDs:EOS:0123456789abcdef0123456789abcdef| Player Controller ID: ctrlA)caused by BP_AK74_C";
        let died_line = "LogSquadTrace: [DedicatedServer]ASQSoldier::Die(): Player:Bob KillingDamage=100 from BP_Soldier (Online IDs:EOS:fedcba9876543210fedcba9876543210| Contoller ID: ctrlB) caused by BP_Frag_C";

        let mut store = EventStore::new();
        let damaged_caps = PLAYER_DAMAGED_RE.captures(damaged_line).unwrap();
        player_damaged(&damaged_caps, Utc::now(), ChainId(1), damaged_line, &mut store);

        let died_caps = PLAYER_DIED_RE.captures(died_line).unwrap();
        let events = player_died(&died_caps, Utc::now(), ChainId(1), died_line, &mut store);
        match &events[0] {
            Event::PlayerDied { attacker_name, suicide, .. } => {
                assert_eq!(attacker_name, "Alice");
                assert!(!suicide);
            }
            _ => panic!("expected PlayerDied"),
        }
    }

    #[test]
    fn wounded_attacker_fields_come_from_correlated_damage_session() {
        let damaged_line = "LogSquad: Player:Bob ActualDamage=40.0 from Alice (Online IDs:EOS:0123456789abcdef0123456789abcdef| Player Controller ID: ctrlA)caused by BP_AK74_C";
        let wounded_line = "LogSquadTrace: [DedicatedServer]ASQSoldier::Wound(): Player:Bob KillingDamage=80 from BP_Soldier (Online IDs:EOS:fedcba9876543210fedcba9876543210| Contoller ID: ctrlB) caused by BP_Frag_C";

        let mut store = EventStore::new();
        let damaged_caps = PLAYER_DAMAGED_RE.captures(damaged_line).unwrap();
        player_damaged(&damaged_caps, Utc::now(), ChainId(1), damaged_line, &mut store);

        let wounded_caps = PLAYER_WOUNDED_RE.captures(wounded_line).unwrap();
        let events = player_wounded(&wounded_caps, Utc::now(), ChainId(1), wounded_line, &mut store);
        match &events[0] {
            Event::PlayerWounded { attacker_name, .. } => assert_eq!(attacker_name, "Alice"),
            _ => panic!("expected PlayerWounded"),
        }
    }
}
