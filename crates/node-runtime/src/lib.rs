//! # Ledger Node Runtime
//!
//! Assembles the ledger node: configuration, store, ledger service and the
//! HTTP gateway. The `ledger-node` binary in `main.rs` is a thin CLI over
//! [`NodeRuntime`].
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, file, environment, flags)
//! 2. Open the store and seed it when configured
//! 3. Serve the gateway until the shutdown signal resolves

pub mod container;

pub use container::{ConfigError, LedgerContainer, NodeConfig, StorageBackend, StorageConfig};

use anyhow::{Context, Result};
use ledger_gateway::GatewayService;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The running node.
pub struct NodeRuntime {
    container: Arc<LedgerContainer>,
    gateway: GatewayService,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!(
            backend = ?config.storage.backend,
            seed = config.storage.seed,
            "Creating ledger node runtime"
        );
        let container = LedgerContainer::new(config)?;
        let gateway = GatewayService::new(container.config.gateway.clone(), Arc::clone(&container.api))
            .context("Failed to build gateway")?;
        Ok(Self {
            container: Arc::new(container),
            gateway,
        })
    }

    pub fn container(&self) -> Arc<LedgerContainer> {
        Arc::clone(&self.container)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.container.config.gateway.http_addr(), "Starting ledger node");
        self.gateway.serve(shutdown).await?;
        info!("Shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener.
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.gateway.serve_on(listener, shutdown).await?;
        info!("Shutdown complete");
        Ok(())
    }
}
