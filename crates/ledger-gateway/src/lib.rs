//! # ledger-gateway
//!
//! HTTP interface for the contract ledger.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     LEDGER GATEWAY                       │
//! ├──────────────────────────────────────────────────────────┤
//! │   Tracing (request id, status, metrics)                  │
//! │     → Timeout (reads only) → Body limit                  │
//! │       → ProfileLayer (`profile_id` header → Caller)      │
//! │         → handlers (spawn_blocking)                      │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │  Arc<dyn LedgerApi>
//!                              ▼
//!                        ledger-core
//! ```
//!
//! `/health` and `/metrics` bypass profile resolution.
//!
//! # Usage
//!
//! ```ignore
//! use ledger_gateway::{GatewayConfig, GatewayService};
//!
//! let service = GatewayService::new(GatewayConfig::default(), api)?;
//! service.serve(shutdown_signal()).await?;
//! ```

pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::*;
pub use middleware::{Caller, LedgerMetrics, PROFILE_HEADER};
pub use router::{build_router, AppState};
pub use service::GatewayService;
