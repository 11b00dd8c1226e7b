//! Pure functions from RCON text responses to typed structures.
//!
//! Malformed lines are skipped with a warning; these functions never panic
//! and never return an error — a line either parses into a value or is
//! dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use squad_core::{ChatChannel, EosId, SquadId, TeamId};

/// One row of `ListPlayers`' active-player section.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedPlayer {
    pub player_id: u32,
    pub eos_id: EosId,
    pub steam_id: Option<String>,
    pub name: String,
    pub team_id: Option<TeamId>,
    pub squad_id: Option<SquadId>,
    pub is_leader: bool,
    pub role: String,
}

/// One row of `ListPlayers`' "Recently Disconnected" section.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectedPlayer {
    pub player_id: u32,
    pub eos_id: EosId,
    pub since_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListPlayersResult {
    pub players: Vec<ListedPlayer>,
    pub disconnected: Vec<DisconnectedPlayer>,
}

/// One row of `ListSquads`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedSquad {
    pub team_id: TeamId,
    pub faction: String,
    pub squad_id: SquadId,
    pub name: String,
    pub size: u32,
    pub locked: bool,
    pub creator_name: String,
    pub creator_eos_id: Option<EosId>,
    pub creator_steam_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentMap {
    pub level: String,
    pub layer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NextMap {
    pub level: Option<String>,
    pub layer: Option<String>,
}

/// A chat line parsed off a `CHAT_VALUE` packet body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedChat {
    pub channel: ChatChannel,
    pub eos_id: EosId,
    pub steam_id: Option<String>,
    pub name: String,
    pub message: String,
}

static PLAYER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^ID: (?P<id>\d+) \| Online IDs: EOS: (?P<eos>[0-9a-fA-F]{32})",
        r"(?: steam: (?P<steam>\d+))? \| Name: (?P<name>.+) \| Team ID: (?P<team>\d+)",
        r" \| Squad ID: (?P<squad>N/A|\d+) \| Is Leader: (?P<leader>True|False) \| Role: (?P<role>.+)$",
    ))
    .expect("valid regex")
});

static DISCONNECTED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ID: (?P<id>\d+) \| Online IDs: EOS: (?P<eos>[0-9a-fA-F]{32}).* Since Disconnect: (?P<since>\d+)")
        .expect("valid regex")
});

static SQUAD_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Team ID: (?P<team>\d+) \((?P<faction>.+)\)$").expect("valid regex"));

static SQUAD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^ID: (?P<id>\d+) \| Name: (?P<name>.+) \| Size: (?P<size>\d+) \| Locked: (?P<locked>True|False)",
        r" \| Creator Name: (?P<creator>.+) \| Creator Online IDs: EOS: (?P<eos>[0-9a-fA-F]{32})(?: steam: (?P<steam>\d+))?$",
    ))
    .expect("valid regex")
});

static CURRENT_MAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Current level is (?P<level>[^,]+), layer is (?P<layer>[^,]+)").expect("valid regex"));

static NEXT_MAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Next level is (?P<level>[^,]+), layer is (?P<layer>[^,]+)").expect("valid regex"));

static CHAT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\[(?P<channel>ChatAll|ChatTeam|ChatSquad|ChatAdmin)\] ",
        r"\[Online IDs:EOS:(?P<eos>[0-9a-fA-F]{32}) steam:(?P<steam>\d+)?\] ",
        r"(?P<name>.+) : (?P<message>.+)$",
    ))
    .expect("valid regex")
});

/// Parse the body of a `ListPlayers` response.
pub fn parse_list_players(body: &str) -> ListPlayersResult {
    let mut result = ListPlayersResult::default();
    let mut in_disconnected_section = false;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("----- Recently Disconnected") {
            in_disconnected_section = true;
            continue;
        }
        if line.starts_with("----- Active Players") {
            in_disconnected_section = false;
            continue;
        }

        if in_disconnected_section {
            match DISCONNECTED_LINE.captures(line) {
                Some(caps) => {
                    let Some(player) = build_disconnected(&caps) else {
                        warn!("unparseable disconnected-player line: {}", line);
                        continue;
                    };
                    result.disconnected.push(player);
                }
                None => warn!("unparseable disconnected-player line: {}", line),
            }
        } else {
            match PLAYER_LINE.captures(line) {
                Some(caps) => match build_listed_player(&caps) {
                    Some(player) => result.players.push(player),
                    None => warn!("unparseable player line: {}", line),
                },
                None => warn!("unparseable player line: {}", line),
            }
        }
    }

    result
}

fn build_listed_player(caps: &regex::Captures) -> Option<ListedPlayer> {
    let eos_id = EosId::new(&caps["eos"]).ok()?;
    let team_id = caps["team"].parse::<u8>().ok().and_then(|v| TeamId::new(v).ok());
    let squad_id = match &caps["squad"] {
        "N/A" => None,
        digits => digits.parse::<u8>().ok().and_then(|v| SquadId::new(v).ok()),
    };
    Some(ListedPlayer {
        player_id: caps["id"].parse().ok()?,
        eos_id,
        steam_id: caps.name("steam").map(|m| m.as_str().to_string()),
        name: caps["name"].to_string(),
        team_id,
        squad_id,
        is_leader: &caps["leader"] == "True",
        role: caps["role"].to_string(),
    })
}

fn build_disconnected(caps: &regex::Captures) -> Option<DisconnectedPlayer> {
    Some(DisconnectedPlayer {
        player_id: caps["id"].parse().ok()?,
        eos_id: EosId::new(&caps["eos"]).ok()?,
        since_seconds: caps["since"].parse().ok()?,
    })
}

/// Parse the body of a `ListSquads` response.
pub fn parse_list_squads(body: &str) -> Vec<ListedSquad> {
    let mut squads = Vec::new();
    let mut current_team: Option<(TeamId, String)> = None;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = SQUAD_HEADER.captures(line) {
            let Some(team_id) = caps["team"].parse::<u8>().ok().and_then(|v| TeamId::new(v).ok()) else {
                warn!("unparseable squad team header: {}", line);
                current_team = None;
                continue;
            };
            current_team = Some((team_id, caps["faction"].to_string()));
            continue;
        }
        let Some((team_id, faction)) = current_team.clone() else {
            continue;
        };
        match SQUAD_LINE.captures(line) {
            Some(caps) => match build_squad(&caps, team_id, &faction) {
                Some(squad) => squads.push(squad),
                None => warn!("unparseable squad line: {}", line),
            },
            None => warn!("unparseable squad line: {}", line),
        }
    }

    squads
}

fn build_squad(caps: &regex::Captures, team_id: TeamId, faction: &str) -> Option<ListedSquad> {
    let squad_id = caps["id"].parse::<u8>().ok().and_then(|v| SquadId::new(v).ok())?;
    Some(ListedSquad {
        team_id,
        faction: faction.to_string(),
        squad_id,
        name: caps["name"].to_string(),
        size: caps["size"].parse().ok()?,
        locked: &caps["locked"] == "True",
        creator_name: caps["creator"].to_string(),
        creator_eos_id: EosId::new(&caps["eos"]).ok(),
        creator_steam_id: caps.name("steam").map(|m| m.as_str().to_string()),
    })
}

/// Parse the body of a `ShowCurrentMap` response.
pub fn parse_current_map(body: &str) -> Option<CurrentMap> {
    let caps = CURRENT_MAP.captures(body.trim())?;
    Some(CurrentMap {
        level: caps["level"].to_string(),
        layer: Some(caps["layer"].to_string()),
    })
}

/// Parse the body of a `ShowNextMap` response. An empty next map yields both
/// fields `None`.
pub fn parse_next_map(body: &str) -> NextMap {
    match NEXT_MAP.captures(body.trim()) {
        Some(caps) => NextMap {
            level: Some(caps["level"].to_string()),
            layer: Some(caps["layer"].to_string()),
        },
        None => NextMap {
            level: None,
            layer: None,
        },
    }
}

/// Parse one `CHAT_VALUE` packet body.
pub fn parse_chat(body: &str) -> Option<ParsedChat> {
    let caps = CHAT_LINE.captures(body.trim())?;
    let eos_id = EosId::new(&caps["eos"]).ok()?;
    let channel = match &caps["channel"] {
        "ChatAll" => ChatChannel::ChatAll,
        "ChatTeam" => ChatChannel::ChatTeam,
        "ChatSquad" => ChatChannel::ChatSquad,
        "ChatAdmin" => ChatChannel::ChatAdmin,
        _ => return None,
    };
    Some(ParsedChat {
        channel,
        eos_id,
        steam_id: caps.name("steam").map(|m| m.as_str().to_string()),
        name: caps["name"].to_string(),
        message: caps["message"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_active_and_disconnected_players() {
        let body = "----- Active Players -----\n\
ID: 0 | Online IDs: EOS: 0123456789abcdef0123456789abcdef steam: 76561198000000000 | Name: Alice | Team ID: 1 | Squad ID: 2 | Is Leader: True | Role: Rifleman\n\
----- Recently Disconnected Players [Max of 15] -----\n\
ID: 1 | Online IDs: EOS: fedcba9876543210fedcba9876543210 | Since Disconnect: 42";

        let parsed = parse_list_players(body);
        assert_eq!(parsed.players.len(), 1);
        assert_eq!(parsed.players[0].name, "Alice");
        assert!(parsed.players[0].is_leader);
        assert_eq!(parsed.players[0].squad_id.unwrap().get(), 2);
        assert_eq!(parsed.disconnected.len(), 1);
        assert_eq!(parsed.disconnected[0].since_seconds, 42);
    }

    #[test]
    fn parses_squads_with_team_header_carry_over() {
        let body = "Team ID: 1 (Irregular Forces)\n\
ID: 1 | Name: Alpha | Size: 6 | Locked: False | Creator Name: Bob | Creator Online IDs: EOS: 0123456789abcdef0123456789abcdef\n\
Team ID: 2 (Regular Forces)\n\
ID: 1 | Name: Bravo | Size: 3 | Locked: True | Creator Name: Carl | Creator Online IDs: EOS: fedcba9876543210fedcba9876543210 steam: 1";

        let squads = parse_list_squads(body);
        assert_eq!(squads.len(), 2);
        assert_eq!(squads[0].faction, "Irregular Forces");
        assert_eq!(squads[1].team_id.get(), 2);
        assert!(squads[1].locked);
    }

    #[test]
    fn parses_current_and_empty_next_map() {
        let current = parse_current_map("Current level is Narva, layer is Narva_Invasion_v1, factions ...").unwrap();
        assert_eq!(current.level, "Narva");

        let next = parse_next_map("");
        assert!(next.level.is_none());
        assert!(next.layer.is_none());
    }

    #[test]
    fn parses_chat_message() {
        let body = "[ChatAll] [Online IDs:EOS:0123456789abcdef0123456789abcdef steam:76561198000000000] Alice : hello team";
        let parsed = parse_chat(body).unwrap();
        assert_eq!(parsed.channel, ChatChannel::ChatAll);
        assert_eq!(parsed.name, "Alice");
        assert_eq!(parsed.message, "hello team");
    }
}
