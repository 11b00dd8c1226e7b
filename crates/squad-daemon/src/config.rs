//! CLI flags and env-var fallback for the daemon binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use squad_server::FacadeConfig;

#[derive(Parser, Debug)]
#[command(name = "squad-daemon", about = "Squad RCON control-plane daemon")]
pub struct DaemonConfig {
    /// RCON server host.
    #[arg(long, env = "SQUAD_RCON_HOST")]
    pub rcon_host: String,

    /// RCON server port.
    #[arg(long, env = "SQUAD_RCON_PORT", default_value = "21114")]
    pub rcon_port: u16,

    /// RCON admin password.
    #[arg(long, env = "SQUAD_RCON_PASSWORD")]
    pub rcon_password: String,

    /// Path to the live SquadGame.log file to tail.
    #[arg(long, env = "SQUAD_LOG_PATH")]
    pub log_path: PathBuf,

    /// Seconds to wait for a single RCON command response.
    #[arg(long, env = "SQUAD_COMMAND_TIMEOUT_SECS", default_value = "10")]
    pub command_timeout_secs: u64,

    /// Seconds to wait for the initial TCP connect + auth.
    #[arg(long, env = "SQUAD_CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,

    /// Idle seconds before sending a keep-alive ping.
    #[arg(long, env = "SQUAD_KEEPALIVE_IDLE_SECS", default_value = "30")]
    pub keepalive_idle_secs: u64,

    /// Max queued commands before rejecting new ones with `QueueFull`.
    #[arg(long, env = "SQUAD_COMMAND_QUEUE_BOUND", default_value = "256")]
    pub command_queue_bound: usize,

    /// Max events held per event-bus subscription before oldest are dropped.
    #[arg(long, env = "SQUAD_BUS_QUEUE_BOUND", default_value = "1024")]
    pub bus_queue_bound: usize,

    /// Ceiling (seconds) the exponential reconnect backoff schedule saturates to.
    #[arg(long, env = "SQUAD_BACKOFF_CAP_SECS", default_value = "30")]
    pub backoff_cap_secs: u64,

    /// Seconds between periodic `ListPlayers`/`ListSquads` reconciliation sweeps.
    #[arg(long, env = "SQUAD_RECONCILE_PERIOD_SECS", default_value = "30")]
    pub reconcile_period_secs: u64,
}

impl DaemonConfig {
    pub fn rcon_addr(&self) -> String {
        format!("{}:{}", self.rcon_host, self.rcon_port)
    }

    pub fn into_facade_config(self) -> FacadeConfig {
        let mut facade = FacadeConfig::new(self.rcon_addr(), self.rcon_password, self.log_path);
        facade.session.command_timeout = Duration::from_secs(self.command_timeout_secs);
        facade.session.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        facade.session.keepalive_idle = Duration::from_secs(self.keepalive_idle_secs);
        facade.session.queue_bound = self.command_queue_bound;
        facade.session.backoff_cap = Duration::from_secs(self.backoff_cap_secs);
        facade.bus_queue_bound = self.bus_queue_bound;
        facade.reconcile_period = Duration::from_secs(self.reconcile_period_secs);
        facade
    }
}
