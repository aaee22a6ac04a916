//! Core error types for `Stampkit`.

use thiserror::Error;

/// Core error type for `Stampkit` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Platform id not recognised.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Invalid data in a payload or credential.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
