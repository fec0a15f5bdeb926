//! Middleware stack for the gateway.
//!
//! Layer order: Request → Tracing → Timeout (safe methods) → BodyLimit → (matched route) ProfileLayer → Handler

pub mod auth;
pub mod metrics;
pub mod timeout;
pub mod tracing;

pub use auth::{Caller, ProfileLayer, PROFILE_HEADER};
pub use metrics::{LedgerMetrics, RequestTimer};
pub use timeout::TimeoutLayer;
pub use self::tracing::{TracingLayer, REQUEST_ID_HEADER};
