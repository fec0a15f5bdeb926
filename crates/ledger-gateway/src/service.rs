//! Gateway service - binds the HTTP listener and serves the router until
//! shutdown.

use crate::domain::{GatewayConfig, GatewayError};
use crate::middleware::LedgerMetrics;
use crate::router::{build_router, AppState};
use axum::Router;
use ledger_core::LedgerApi;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct GatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayService {
    pub fn new(config: GatewayConfig, api: Arc<dyn LedgerApi>) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        let state = AppState::new(api, config.clone());
        Ok(Self { config, state })
    }

    pub fn metrics(&self) -> Arc<LedgerMetrics> {
        Arc::clone(&self.state.metrics)
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?local, "Ledger gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("Ledger gateway stopped");
        Ok(())
    }
}
