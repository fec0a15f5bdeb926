//! # Ledger Container
//!
//! Opens the configured store, seeds it when asked, and wires the ledger
//! service that the gateway serves.

pub mod config;

pub use config::{ConfigError, NodeConfig, StorageBackend, StorageConfig};

use anyhow::{Context, Result};
use ledger_core::{demo_fixture, seed_store, InMemoryLedger, LedgerApi, LedgerService};
use std::sync::Arc;
use tracing::info;

/// Initialized ledger ready to be served.
pub struct LedgerContainer {
    pub config: NodeConfig,
    pub api: Arc<dyn LedgerApi>,
}

impl LedgerContainer {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let api = match config.storage.backend {
            StorageBackend::Memory => open_memory(&config.storage)?,
            StorageBackend::Sqlite => open_sqlite(&config.storage)?,
        };

        Ok(Self { config, api })
    }
}

fn open_memory(storage: &StorageConfig) -> Result<Arc<dyn LedgerApi>> {
    info!("Using in-memory ledger");
    let store = Arc::new(InMemoryLedger::new());
    if storage.seed {
        seed_store(store.as_ref(), &demo_fixture()).context("Failed to seed in-memory ledger")?;
    }
    Ok(Arc::new(LedgerService::from_store(store)))
}

#[cfg(feature = "sqlite")]
fn open_sqlite(storage: &StorageConfig) -> Result<Arc<dyn LedgerApi>> {
    use ledger_core::SqliteLedger;

    if let Some(dir) = storage.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }

    let store = Arc::new(
        SqliteLedger::open(&storage.path)
            .with_context(|| format!("Failed to open {}", storage.path.display()))?,
    );

    if storage.seed {
        if store.is_empty()? {
            seed_store(store.as_ref(), &demo_fixture()).context("Failed to seed SQLite ledger")?;
        } else {
            info!("SQLite ledger already provisioned, skipping seed");
        }
    }
    Ok(Arc::new(LedgerService::from_store(store)))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_storage: &StorageConfig) -> Result<Arc<dyn LedgerApi>> {
    anyhow::bail!("this build has no SQLite support; rebuild with the `sqlite` feature")
}
