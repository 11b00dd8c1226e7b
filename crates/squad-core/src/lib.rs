//! # squad-core
//!
//! Core types shared across the Squad RCON control-plane daemon:
//! - Opaque identifier newtypes (`EosId`, `SteamId`, `ChainId`, ...)
//! - The live `Player` record and its merge semantics
//! - The closed `Event` taxonomy
//! - The closed `SquadError` taxonomy

pub mod error;
pub mod event;
pub mod ids;
pub mod player;

pub use error::{Result, SquadError};
pub use event::{ChatChannel, Event, OnlineIds, RoundSide};
pub use ids::{ChainId, EosId, IdError, PlayerController, SquadId, SteamId, TeamId};
pub use player::Player;
