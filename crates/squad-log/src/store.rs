//! The short-lived correlation store. Single-threaded: the engine
//! guarantees no concurrent mutator, so every table is a plain `HashMap`
//! with no internal locking.

use std::collections::HashMap;

use squad_core::{ChainId, EosId, Player, RoundSide, TeamId};

/// A partial player record plus the network details captured at connect
/// time, pending the matching `player-join-succeeded` line.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub player: Player,
    pub ip: String,
    pub chain_id: ChainId,
}

/// The last damage dealt to a not-yet-dead player, joining damage/wound
/// lines to the eventual death or revive.
#[derive(Debug, Clone, PartialEq)]
pub struct LastDamage {
    pub damage: f64,
    pub weapon: String,
    pub attacker_name: String,
    pub attacker_eos_id: EosId,
    pub attacker_steam_id: Option<String>,
    pub attacker_controller: String,
}

/// Transient record joining a victim's damage/wound line to their eventual
/// death or revive line.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatSession {
    pub chain_id: Option<ChainId>,
    pub last_damage: LastDamage,
}

/// Accumulates across `round-tickets` lines until cleared by `new-game`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundResult {
    pub winner: Option<RoundSide>,
    pub loser: Option<RoundSide>,
    pub layer: Option<String>,
    pub level: Option<String>,
}

/// The five correlation tables rule callbacks read and write.
#[derive(Debug, Default)]
pub struct EventStore {
    pub players: HashMap<EosId, Player>,
    pub join_requests: HashMap<ChainId, JoinRequest>,
    pub sessions: HashMap<String, CombatSession>,
    pub disconnected: HashMap<EosId, ()>,
    pub round_result: RoundResult,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge a (possibly partial) player record.
    pub fn upsert_player(&mut self, player: Player) {
        match self.players.get_mut(&player.eos_id) {
            Some(existing) => existing.merge(player),
            None => {
                self.players.insert(player.eos_id.clone(), player);
            }
        }
    }

    pub fn player(&self, eos_id: &EosId) -> Option<&Player> {
        self.players.get(eos_id)
    }

    pub fn player_by_team(&self, team_id: TeamId) -> Vec<&Player> {
        self.players.values().filter(|p| p.team_id == Some(team_id)).collect()
    }

    /// Clear everything `new-game` clears: join requests, combat sessions,
    /// the disconnected marker set, and the accumulated round result. The
    /// live player table is preserved — it's reconciled by the next RCON
    /// `ListPlayers` sweep instead.
    pub fn clear_on_new_game(&mut self) {
        self.join_requests.clear();
        self.sessions.clear();
        self.disconnected.clear();
        self.round_result = RoundResult::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squad_core::EosId;

    fn eos(s: &str) -> EosId {
        EosId::new(s).unwrap()
    }

    #[test]
    fn new_game_preserves_players_but_clears_everything_else() {
        let mut store = EventStore::new();
        store.upsert_player(Player::new(eos("0123456789abcdef0123456789abcdef")));
        store.join_requests.insert(
            ChainId(1),
            JoinRequest {
                player: Player::new(eos("0123456789abcdef0123456789abcdef")),
                ip: "10.0.0.1".to_string(),
                chain_id: ChainId(1),
            },
        );
        store.disconnected.insert(eos("fedcba9876543210fedcba9876543210"), ());

        store.clear_on_new_game();

        assert_eq!(store.players.len(), 1);
        assert!(store.join_requests.is_empty());
        assert!(store.disconnected.is_empty());
        assert_eq!(store.round_result, RoundResult::default());
    }

    #[test]
    fn upsert_merges_into_existing_record() {
        let mut store = EventStore::new();
        let id = eos("0123456789abcdef0123456789abcdef");
        store.upsert_player(Player::new(id.clone()));

        let mut update = Player::new(id.clone());
        update.name = Some("Alice".to_string());
        store.upsert_player(update);

        assert_eq!(store.player(&id).unwrap().name, Some("Alice".to_string()));
    }
}
