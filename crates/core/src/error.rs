//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a local, deterministic, non-retryable failure. Nothing
/// here is ever silently corrected: callers surface the kind and message as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Entity missing, or not owned by the caller (the two are indistinguishable
    /// on purpose).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input (bad id, bad decimal, unknown enum value, bad date).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Uniqueness clash, e.g. a duplicate sibling account name.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A ledger rule was violated (unbalanced splits, type mismatch, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Anything unclassified. The message is for logs, not for callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "not_found",
            DomainError::BadRequest(_) => "bad_request",
            DomainError::Conflict(_) => "conflict",
            DomainError::Validation(_) => "validation_error",
            DomainError::Internal(_) => "internal_error",
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            DomainError::NotFound(m)
            | DomainError::BadRequest(m)
            | DomainError::Conflict(m)
            | DomainError::Validation(m)
            | DomainError::Internal(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DomainError::not_found("x").code(), "not_found");
        assert_eq!(DomainError::bad_request("x").code(), "bad_request");
        assert_eq!(DomainError::conflict("x").code(), "conflict");
        assert_eq!(DomainError::validation("x").code(), "validation_error");
        assert_eq!(DomainError::internal("x").code(), "internal_error");
    }

    #[test]
    fn message_strips_kind_prefix() {
        let err = DomainError::validation("splits must balance");
        assert_eq!(err.message(), "splits must balance");
        assert_eq!(err.to_string(), "validation failed: splits must balance");
    }
}
