//! Calculator server entry point.
//!
//! Parses the command line, loads configuration, initializes logging and runs
//! the server until a `shutdown` command or termination signal has been
//! received and every session has drained.

mod cli;
mod config;
mod logging;
mod signals;

use anyhow::{anyhow, Context};
use calc_server::CalcServer;
use clap::Parser;
use cli::Args;
use config::AppConfig;
use tracing::{error, info, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("❌ Server error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path).await?,
        None => AppConfig::default(),
    };
    config.apply_overrides(&args);
    config
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;

    logging::setup_logging(&config.logging)?;
    info!("Starting calcd v{}", env!("CARGO_PKG_VERSION"));

    let server = CalcServer::new(config.to_server_config(args.address));
    let listener = server
        .bind()
        .with_context(|| format!("Failed to listen on {}", args.address))?;

    if let Err(e) = signals::install(server.shutdown_signal()) {
        warn!("Signal handling unavailable: {}", e);
    }

    server.serve(listener).await?;
    info!("👋 calcd shutdown complete");
    Ok(())
}
