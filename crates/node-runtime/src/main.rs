//! # ledger-node
//!
//! Serves the contract ledger over HTTP.
//!
//! ```text
//! ledger-node                                   # in-memory store, demo data, :3001
//! ledger-node --storage sqlite --db-path ./ledger.db
//! ledger-node --config node.toml --port 8080 --no-seed
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ledger_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime, StorageBackend};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Contractor/client payment ledger node", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "LEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage backend
    #[arg(long, value_enum)]
    storage: Option<StorageBackend>,

    /// SQLite database file
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Load the demo dataset into an empty store
    #[arg(long, conflicts_with = "no_seed")]
    seed: bool,

    /// Start with an empty store
    #[arg(long)]
    no_seed: bool,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(port) = self.port {
            config.gateway.http.port = port;
        }
        if let Some(backend) = self.storage {
            config.storage.backend = backend;
        }
        if let Some(path) = &self.db_path {
            config.storage.path = path.clone();
        }
        if self.seed {
            config.storage.seed = true;
        }
        if self.no_seed {
            config.storage.seed = false;
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let mut config = NodeConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let runtime = NodeRuntime::new(config)?;
    info!("Node is running. Press Ctrl+C to stop.");
    runtime.run(shutdown_signal()).await
}
