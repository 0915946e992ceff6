//! SLA Daemon - periodic SLA milestone evaluation
//!
//! The SLA daemon provides:
//! - A scheduler that evaluates every ticket against its SLA deadlines
//! - Milestone alerts to ticket assignees
//! - Auto-closing of resolved tickets after a grace period
//! - A small REST API for health, tracking records and manual cycles

use clap::Parser;
use sla_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SLA Daemon CLI
#[derive(Parser)]
#[command(name = "slad")]
#[command(about = "SLA Daemon - ticket SLA milestone evaluation", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SLA_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "SLA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SLA_LOG_JSON")]
    json: bool,

    /// Run a single cycle, print its report as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Initialize tracing
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        interval_secs = config.scheduler.interval_secs,
        grace_period_secs = config.sla.grace_period_secs,
        "Starting SLA daemon"
    );

    let server = Server::new(config).await?;

    if cli.once {
        let report = server.run_once().await;
        let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{}", json);
        return Ok(());
    }

    server.run().await
}
