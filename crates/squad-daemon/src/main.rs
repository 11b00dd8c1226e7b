//! Squad RCON control-plane daemon.
//!
//! Parses CLI/env configuration, starts the server façade, and runs until
//! an operator sends SIGINT, cleanly draining in-flight work on the way
//! down.

mod config;

use anyhow::Result;
use clap::Parser;
use squad_server::ServerFacade;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::DaemonConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = DaemonConfig::parse();
    info!(addr = %config.rcon_addr(), log_path = ?config.log_path, "squad-daemon starting");

    let facade = ServerFacade::start(config.into_facade_config()).await;

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining");
    facade.stop().await;

    Ok(())
}
