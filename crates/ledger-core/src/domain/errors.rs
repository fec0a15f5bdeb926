use super::Money;
use thiserror::Error;

/// Failure taxonomy for every ledger operation.
///
/// Validation runs in a fixed order per operation (format → identity/ownership
/// → role → business rule); the first failing check decides the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No resolvable caller.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Caller is not entitled to the target resource or self-action.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Policy rule violated (role mismatch, deposit cap).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Payer cannot cover the job price.
    #[error("Insufficient Balance")]
    InsufficientBalance { required: Money, available: Money },

    /// Malformed or missing input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No matching resource. Empty list results are reported this way too.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The unit of work lost a race and was rolled back. Safe to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected store or transaction failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// True when the caller may retry the whole operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Conflict(_))
    }

    /// True for rejections caused by a business rule rather than bad input.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::Forbidden(_) | LedgerError::InsufficientBalance { .. }
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
