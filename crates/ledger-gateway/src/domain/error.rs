//! HTTP error mapping for ledger failures.
//!
//! | LedgerError | Status | Body |
//! |---|---|---|
//! | Unauthenticated, Unauthorized | 401 | empty |
//! | NotFound | 404 | empty |
//! | Forbidden, InsufficientBalance | 403 | `{"message": ..}` |
//! | BadRequest | 400 | `{"message": ..}` |
//! | Conflict | 409 | `{"message": ..}` |
//! | Internal | 500 | `{"message": "Internal Server Error"}` |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledger_core::LedgerError;
use tracing::error;

/// Error returned by a handler, rendered as a status with an optional
/// `{"message"}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    /// `None` renders an empty body
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::empty(StatusCode::UNAUTHORIZED)
    }

    pub fn not_found() -> Self {
        Self::empty(StatusCode::NOT_FOUND)
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, details)
    }

    pub fn timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, "Request timed out")
    }

    /// Detail is logged, never sent.
    pub fn internal(details: impl std::fmt::Display) -> Self {
        error!(error = %details, "Internal error while serving request");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Unauthenticated | LedgerError::Unauthorized(_) => Self::unauthorized(),
            LedgerError::NotFound(_) => Self::not_found(),
            LedgerError::Forbidden(message) => Self::new(StatusCode::FORBIDDEN, message),
            e @ LedgerError::InsufficientBalance { .. } => {
                Self::new(StatusCode::FORBIDDEN, e.to_string())
            }
            LedgerError::BadRequest(message) => Self::bad_request(message),
            LedgerError::Conflict(message) => Self::new(StatusCode::CONFLICT, message),
            LedgerError::Internal(details) => Self::internal(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => {
                (self.status, Json(serde_json::json!({ "message": message }))).into_response()
            }
            None => self.status.into_response(),
        }
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server loop failed
    #[error("server error: {0}")]
    Serve(String),
}
