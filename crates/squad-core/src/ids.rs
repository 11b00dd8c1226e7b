//! Opaque identifier newtypes for the data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Epic Online Services identifier — 32 lowercase hex chars. Primary player identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EosId(String);

/// Errors constructing the value-type identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("EOS id must be 32 hex chars, got {0:?}")]
    InvalidEosId(String),
    #[error("steam id must be decimal digits, got {0:?}")]
    InvalidSteamId(String),
    #[error("team id must be 1 or 2, got {0}")]
    InvalidTeamId(u8),
    #[error("squad id must be in [0, 50], got {0}")]
    InvalidSquadId(u8),
    #[error("player controller does not match the expected shape: {0:?}")]
    InvalidController(String),
}

impl EosId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        let lower = raw.to_ascii_lowercase();
        if lower.len() == 32 && lower.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(lower))
        } else {
            Err(IdError::InvalidEosId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EosId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EosId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Steam64 identifier — decimal digits. Optional secondary identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SteamId(String);

impl SteamId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw))
        } else {
            Err(IdError::InvalidSteamId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SteamId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Per-causal-chain counter embedded in the game log prefix (`[chain]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub i64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ChainId)
    }
}

/// Opaque `(BP_)?PlayerController(...)_C_<digits>` reference into the game's
/// object graph. Never parsed beyond "is it this shape".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerController(String);

impl PlayerController {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        let body = raw.strip_prefix("BP_").unwrap_or(&raw);
        let looks_right = body.contains("PlayerController")
            && body
                .rsplit('_')
                .next()
                .map(|tail| !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()))
                .unwrap_or(false);
        if looks_right {
            Ok(Self(raw))
        } else {
            Err(IdError::InvalidController(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A team side, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(u8);

impl TeamId {
    pub fn new(value: u8) -> Result<Self, IdError> {
        if value == 1 || value == 2 {
            Ok(Self(value))
        } else {
            Err(IdError::InvalidTeamId(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A squad number, 0..=50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquadId(u8);

impl SquadId {
    pub fn new(value: u8) -> Result<Self, IdError> {
        if value <= 50 {
            Ok(Self(value))
        } else {
            Err(IdError::InvalidSquadId(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eos_id_accepts_32_hex() {
        let id = EosId::new("0123456789abcdef0123456789ABCDEF").unwrap();
        assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn eos_id_rejects_wrong_length() {
        assert!(EosId::new("abc").is_err());
    }

    #[test]
    fn team_id_only_accepts_one_or_two() {
        assert!(TeamId::new(1).is_ok());
        assert!(TeamId::new(2).is_ok());
        assert!(TeamId::new(3).is_err());
    }

    #[test]
    fn squad_id_bounds() {
        assert!(SquadId::new(0).is_ok());
        assert!(SquadId::new(50).is_ok());
        assert!(SquadId::new(51).is_err());
    }

    #[test]
    fn player_controller_shape() {
        assert!(PlayerController::new("BP_PlayerController_C_12345").is_ok());
        assert!(PlayerController::new("PlayerController_C_1").is_ok());
        assert!(PlayerController::new("SomethingElse").is_err());
    }
}
