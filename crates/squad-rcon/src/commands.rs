//! RCON admin command string builders.
//!
//! Pure functions from typed arguments to the exact command text the game
//! server expects. Kept separate from the façade so both the façade and
//! tests can build/inspect command strings without a live session.

/// `AdminWarn <eosID> <message>`
pub fn admin_warn(eos_id: &str, message: &str) -> String {
    format!("AdminWarn {} {}", eos_id, message)
}

/// `AdminKick <eosID> <reason>`
pub fn admin_kick(eos_id: &str, reason: &str) -> String {
    format!("AdminKick {} {}", eos_id, reason)
}

/// `AdminBan <eosID> <duration> <reason>`. `duration` is the game's own
/// duration grammar (e.g. `0` for permanent, `1d`, `2h`).
pub fn admin_ban(eos_id: &str, duration: &str, reason: &str) -> String {
    format!("AdminBan {} {} {}", eos_id, duration, reason)
}

/// `AdminBroadcast <message>`
pub fn admin_broadcast(message: &str) -> String {
    format!("AdminBroadcast {}", message)
}

/// `AdminChangeLayer <layerName>`
pub fn admin_change_layer(layer_name: &str) -> String {
    format!("AdminChangeLayer {}", layer_name)
}

/// `AdminSetNextLayer <layerName>`
pub fn admin_set_next_layer(layer_name: &str) -> String {
    format!("AdminSetNextLayer {}", layer_name)
}

/// `AdminForceTeamChange <eosID>`
pub fn admin_force_team_change(eos_id: &str) -> String {
    format!("AdminForceTeamChange {}", eos_id)
}

/// `AdminDisbandSquad <teamID> <squadID>`
pub fn admin_disband_squad(team_id: u8, squad_id: u8) -> String {
    format!("AdminDisbandSquad {} {}", team_id, squad_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_exact_command_strings() {
        assert_eq!(admin_warn("abc", "please stop"), "AdminWarn abc please stop");
        assert_eq!(admin_ban("abc", "1d", "teamkilling"), "AdminBan abc 1d teamkilling");
        assert_eq!(admin_disband_squad(1, 3), "AdminDisbandSquad 1 3");
    }
}
