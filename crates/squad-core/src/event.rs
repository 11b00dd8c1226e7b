//! The closed event taxonomy.
//!
//! Every event carries `time` (parsed from the log line or, for RCON-only
//! events, the wall-clock instant the session observed them) and `raw` (the
//! verbatim source line, empty for events with no single source line).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChainId, EosId, SquadId, TeamId};

/// Which chat channel a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatChannel {
    ChatAll,
    ChatTeam,
    ChatSquad,
    ChatAdmin,
}

/// A log-chain/online-id pair observed on a combat-related line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineIds {
    pub eos_id: EosId,
    pub steam_id: Option<String>,
}

/// The closed sum type tagged by event kind. Handlers dispatch on the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    PlayerConnected {
        time: DateTime<Utc>,
        raw: String,
        chain_id: ChainId,
        controller: String,
        ip: String,
        eos_id: EosId,
        steam_id: Option<String>,
    },
    PlayerDisconnected {
        time: DateTime<Utc>,
        raw: String,
        ip: String,
        controller: String,
        eos_id: EosId,
    },
    PlayerJoinSucceeded {
        time: DateTime<Utc>,
        raw: String,
        chain_id: ChainId,
        eos_id: EosId,
        name: String,
    },
    PlayerPossess {
        time: DateTime<Utc>,
        raw: String,
        controller: String,
        pawn: String,
    },
    PlayerUnpossess {
        time: DateTime<Utc>,
        raw: String,
        controller: String,
        pawn: String,
    },
    PlayerDamaged {
        time: DateTime<Utc>,
        raw: String,
        victim_name: String,
        damage: f64,
        weapon: String,
        attacker_name: String,
        attacker_eos_id: EosId,
        attacker_steam_id: Option<String>,
        attacker_controller: String,
    },
    PlayerWounded {
        time: DateTime<Utc>,
        raw: String,
        victim_name: String,
        killing_damage: f64,
        attacker_name: String,
        attacker_eos_id: EosId,
        attacker_steam_id: Option<String>,
        attacker_controller: String,
        weapon: String,
    },
    PlayerDied {
        time: DateTime<Utc>,
        raw: String,
        victim_name: String,
        killing_damage: f64,
        attacker_name: String,
        attacker_eos_id: EosId,
        attacker_steam_id: Option<String>,
        attacker_controller: String,
        weapon: String,
        suicide: bool,
    },
    PlayerRevived {
        time: DateTime<Utc>,
        raw: String,
        reviver_name: String,
        victim_name: String,
    },
    DeployableDamaged {
        time: DateTime<Utc>,
        raw: String,
        deployable: String,
        damage: f64,
        weapon: String,
        instigator: String,
        health_remaining: f64,
    },
    ChatMessage {
        time: DateTime<Utc>,
        raw: String,
        channel: ChatChannel,
        eos_id: EosId,
        steam_id: Option<String>,
        name: String,
        message: String,
    },
    ChatCommand {
        time: DateTime<Utc>,
        raw: String,
        channel: ChatChannel,
        eos_id: EosId,
        steam_id: Option<String>,
        name: String,
        command: String,
        args: Vec<String>,
    },
    NewGame {
        time: DateTime<Utc>,
        raw: String,
        level: String,
        layer_name: String,
        is_first_game: bool,
    },
    RoundEnded {
        time: DateTime<Utc>,
        raw: String,
        winner: Option<RoundSide>,
        loser: Option<RoundSide>,
        layer: String,
        level: String,
    },
    RoundTickets {
        time: DateTime<Utc>,
        raw: String,
        team_id: TeamId,
        faction: String,
        faction_short: String,
        tickets: i64,
        won: bool,
        layer: String,
        level: String,
    },
    RoundWinner {
        time: DateTime<Utc>,
        raw: String,
        team_id: TeamId,
        faction: String,
        tickets: i64,
        layer: String,
        level: String,
    },
    ServerTickRate {
        time: DateTime<Utc>,
        raw: String,
        tick_rate: f64,
    },
    SquadCreated {
        time: DateTime<Utc>,
        raw: String,
        team_id: TeamId,
        squad_id: SquadId,
        squad_name: String,
        creator_eos_id: EosId,
    },
    AdminBroadcast {
        time: DateTime<Utc>,
        raw: String,
        message: String,
        from: String,
    },
    /// Reserved for a future admin-camera log correlation; no rule in this
    /// revision drives it (see DESIGN.md). Present so exhaustive matches on
    /// the taxonomy compile.
    AdminCamera {
        time: DateTime<Utc>,
        raw: String,
        eos_id: EosId,
        name: String,
        entered: bool,
    },
    PlayerKicked {
        time: DateTime<Utc>,
        raw: String,
        eos_id: EosId,
        name: Option<String>,
        reason: String,
    },
    PlayerWarned {
        time: DateTime<Utc>,
        raw: String,
        eos_id: EosId,
        name: Option<String>,
        message: String,
    },
    PlayerBanned {
        time: DateTime<Utc>,
        raw: String,
        eos_id: EosId,
        name: Option<String>,
        duration: String,
        reason: String,
    },
    RconConnected {
        time: DateTime<Utc>,
        raw: String,
        reconnect: bool,
    },
    RconDisconnected {
        time: DateTime<Utc>,
        raw: String,
        reason: String,
        will_reconnect: bool,
    },
    RconError {
        time: DateTime<Utc>,
        raw: String,
        fatal: bool,
        reason: String,
    },
}

/// One side of a finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSide {
    pub team_id: TeamId,
    pub faction: String,
    pub tickets: i64,
}

impl Event {
    /// The wall-clock instant this event carries, regardless of variant.
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Event::PlayerConnected { time, .. }
            | Event::PlayerDisconnected { time, .. }
            | Event::PlayerJoinSucceeded { time, .. }
            | Event::PlayerPossess { time, .. }
            | Event::PlayerUnpossess { time, .. }
            | Event::PlayerDamaged { time, .. }
            | Event::PlayerWounded { time, .. }
            | Event::PlayerDied { time, .. }
            | Event::PlayerRevived { time, .. }
            | Event::DeployableDamaged { time, .. }
            | Event::ChatMessage { time, .. }
            | Event::ChatCommand { time, .. }
            | Event::NewGame { time, .. }
            | Event::RoundEnded { time, .. }
            | Event::RoundTickets { time, .. }
            | Event::RoundWinner { time, .. }
            | Event::ServerTickRate { time, .. }
            | Event::SquadCreated { time, .. }
            | Event::AdminBroadcast { time, .. }
            | Event::AdminCamera { time, .. }
            | Event::PlayerKicked { time, .. }
            | Event::PlayerWarned { time, .. }
            | Event::PlayerBanned { time, .. }
            | Event::RconConnected { time, .. }
            | Event::RconDisconnected { time, .. }
            | Event::RconError { time, .. } => *time,
        }
    }

    /// The stable string tag used for subscription keys.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::PlayerConnected { .. } => "PLAYER_CONNECTED",
            Event::PlayerDisconnected { .. } => "PLAYER_DISCONNECTED",
            Event::PlayerJoinSucceeded { .. } => "PLAYER_JOIN_SUCCEEDED",
            Event::PlayerPossess { .. } => "PLAYER_POSSESS",
            Event::PlayerUnpossess { .. } => "PLAYER_UNPOSSESS",
            Event::PlayerDamaged { .. } => "PLAYER_DAMAGED",
            Event::PlayerWounded { .. } => "PLAYER_WOUNDED",
            Event::PlayerDied { .. } => "PLAYER_DIED",
            Event::PlayerRevived { .. } => "PLAYER_REVIVED",
            Event::DeployableDamaged { .. } => "DEPLOYABLE_DAMAGED",
            Event::ChatMessage { .. } => "CHAT_MESSAGE",
            Event::ChatCommand { .. } => "CHAT_COMMAND",
            Event::NewGame { .. } => "NEW_GAME",
            Event::RoundEnded { .. } => "ROUND_ENDED",
            Event::RoundTickets { .. } => "ROUND_TICKETS",
            Event::RoundWinner { .. } => "ROUND_WINNER",
            Event::ServerTickRate { .. } => "SERVER_TICK_RATE",
            Event::SquadCreated { .. } => "SQUAD_CREATED",
            Event::AdminBroadcast { .. } => "ADMIN_BROADCAST",
            Event::AdminCamera { .. } => "ADMIN_CAMERA",
            Event::PlayerKicked { .. } => "PLAYER_KICKED",
            Event::PlayerWarned { .. } => "PLAYER_WARNED",
            Event::PlayerBanned { .. } => "PLAYER_BANNED",
            Event::RconConnected { .. } => "RCON_CONNECTED",
            Event::RconDisconnected { .. } => "RCON_DISCONNECTED",
            Event::RconError { .. } => "RCON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_matches_taxonomy_name() {
        let event = Event::RconConnected {
            time: Utc::now(),
            raw: String::new(),
            reconnect: false,
        };
        assert_eq!(event.kind(), "RCON_CONNECTED");
    }
}
