//! The live `Player` record and its merge semantics.

use serde::{Deserialize, Serialize};

use crate::ids::{EosId, PlayerController, SquadId, TeamId};

/// A player known to the live table. `eos_id` is the only required field;
/// everything else may be populated incrementally as different log lines
/// and RCON sweeps contribute information about the same player.
///
/// A partial player is the same struct with only the first group of
/// fields (identity + network) populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub eos_id: EosId,
    #[serde(default)]
    pub steam_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub controller: Option<PlayerController>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub squad_id: Option<SquadId>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_squad_leader: Option<bool>,
}

impl Player {
    /// A fresh record carrying only identity.
    pub fn new(eos_id: EosId) -> Self {
        Self {
            eos_id,
            steam_id: None,
            name: None,
            controller: None,
            ip: None,
            suffix: None,
            team_id: None,
            squad_id: None,
            role: None,
            is_squad_leader: None,
        }
    }

    /// Merge another (possibly partial) record of the same player into this
    /// one: updates merge non-nil fields and never overwrite a known field
    /// with a null one.
    pub fn merge(&mut self, other: Player) {
        macro_rules! merge_field {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        merge_field!(steam_id);
        merge_field!(name);
        merge_field!(controller);
        merge_field!(ip);
        merge_field!(suffix);
        merge_field!(team_id);
        merge_field!(squad_id);
        merge_field!(role);
        merge_field!(is_squad_leader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eos(s: &str) -> EosId {
        EosId::new(s).unwrap()
    }

    #[test]
    fn merge_never_overwrites_known_field_with_null() {
        let mut p = Player::new(eos("0123456789abcdef0123456789abcdef"));
        p.name = Some("Alice".to_string());

        let mut update = Player::new(eos("0123456789abcdef0123456789abcdef"));
        update.name = None;
        update.role = Some("Rifleman".to_string());

        p.merge(update);

        assert_eq!(p.name, Some("Alice".to_string()));
        assert_eq!(p.role, Some("Rifleman".to_string()));
    }

    #[test]
    fn merge_overwrites_with_new_non_null_value() {
        let mut p = Player::new(eos("0123456789abcdef0123456789abcdef"));
        p.team_id = Some(TeamId::new(1).unwrap());

        let mut update = Player::new(eos("0123456789abcdef0123456789abcdef"));
        update.team_id = Some(TeamId::new(2).unwrap());

        p.merge(update);
        assert_eq!(p.team_id.unwrap().get(), 2);
    }
}
