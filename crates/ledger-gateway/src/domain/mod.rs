//! Domain types for the gateway: configuration and error mapping.

pub mod config;
pub mod error;

pub use config::{ConfigError, GatewayConfig, HttpConfig, LimitsConfig, ReportingConfig, TimeoutConfig};
pub use error::{ApiError, ApiResult, GatewayError};
