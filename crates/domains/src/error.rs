//! # AppError
//!
//! Centralized error taxonomy for the board feed core. Validation and auth
//! failures surface to the caller exactly once; transient aggregation
//! sub-failures never become errors at all (they degrade to defaults at the
//! point of lookup).

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Stale document reference (e.g., updating a deleted post).
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Client-side validation failure (empty required field, password
    /// mismatch, too many images).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Authentication failure (bad credentials, duplicate account,
    /// malformed email, weak password).
    #[error("authentication error: {0}")]
    AuthError(String),

    /// Infrastructure failure (storage I/O, serialization).
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for board feed logic.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization failure: {err}"))
    }
}
