// src/error.rs

use thiserror::Error;

/// Failure taxonomy for every gateway-backed operation.
/// None of these is fatal; the store is left untouched on all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Transport-level failure. Safe to retry.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Version tag mismatch on update. Re-read the current tag before retrying.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Target no longer exists upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// Payload rejected before any mutation.
    #[error("validation failure: {0}")]
    ValidationFailure(String),
}

impl GatewayError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatewayError::Conflict(_))
    }

    /// Whether resending the same request unchanged could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::NetworkFailure(_))
    }
}

/// Converts `reqwest::Error` into `GatewayError::NetworkFailure`.
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::NetworkFailure(err.to_string())
    }
}

/// A body that does not decode is treated as a transport fault.
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::NetworkFailure(format!("malformed payload: {err}"))
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GatewayError::ValidationFailure(errors.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::NetworkFailure(format!("invalid url: {err}"))
    }
}
