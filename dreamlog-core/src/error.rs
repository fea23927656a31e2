//! Core error types for Dreamlog.

use thiserror::Error;

/// Core error type for Dreamlog operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A token could not be decoded.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
