//! Error types for byshare.

use thiserror::Error;

/// Common error type for byshare.
#[derive(Error, Debug)]
pub enum ByshareError {
    /// Resource not found (unknown or expired id).
    #[error("{0} not found")]
    NotFound(String),

    /// Wrong password supplied for a protected file.
    #[error("incorrect password")]
    WrongPassword,

    /// Daily upload quota exhausted for an identity.
    #[error("upload limit of {limit} files per day reached")]
    QuotaExceeded {
        /// The configured daily ceiling.
        limit: u32,
    },

    /// Upload payload exceeds the configured maximum.
    #[error("file too large (max {max} bytes)")]
    PayloadTooLarge {
        /// The configured maximum in bytes.
        max: u64,
    },

    /// Artifact store read/write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for byshare operations.
pub type Result<T> = std::result::Result<T, ByshareError>;
