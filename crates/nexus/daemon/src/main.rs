//! Sovereign Nexus daemon - autonomous governance loop service
//!
//! The daemon provides:
//! - The governance loop: scheduled decision cycles, cooldown, persistence
//! - REST API for state, audit log, manual anomalies, and loop control
//! - A server-sent event stream of the operator log feed

use clap::Parser;
use nexus_daemon::config::{DaemonConfig, StorageConfig};
use nexus_daemon::error::{DaemonError, DaemonResult};
use nexus_daemon::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Nexus Daemon CLI
#[derive(Parser)]
#[command(name = "nexusd")]
#[command(about = "Sovereign Nexus - autonomous governance loop service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NEXUS_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "NEXUS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Persist snapshots as JSON files in this directory
    #[arg(short, long, env = "NEXUS_DATA_DIR")]
    data_dir: Option<String>,

    /// Log level
    #[arg(long, env = "NEXUS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "NEXUS_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(dir) = &cli.data_dir {
        config.storage = StorageConfig::File { dir: dir.into() };
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json {
        config.logging.json = true;
    }

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
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

    // Print startup banner
    println!(
        r#"
  _   _ _______  ___   _ ____
 | \ | | ____\ \/ / | | / ___|
 |  \| |  _|  \  /| | | \___ \
 | |\  | |___ /  \| |_| |___) |
 |_| \_|_____/_/\_\\___/|____/

  Sovereign Nexus - Autonomous Governance Loop
  Version: {}
  Cycle: every {}s
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.governance.cycle_interval_secs,
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}
