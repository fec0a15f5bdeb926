//! # Ledger Telemetry
//!
//! Structured logging for the ledger node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEDGER_SERVICE_NAME` | `ledger-node` | Service name attached to startup logs |
//! | `LEDGER_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `LEDGER_JSON_LOGS` | `true` in containers | JSON formatted logs |

mod config;
mod subscriber;

pub use config::TelemetryConfig;
pub use subscriber::init_telemetry;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}
