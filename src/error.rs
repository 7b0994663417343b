//! Error types for Lexis.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, LexisError>;

/// Errors produced by indexing, storage and query code.
#[derive(Error, Debug)]
pub enum LexisError {
    /// I/O errors from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors, mostly from configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Index construction or lookup failed.
    #[error("Index error: {0}")]
    Index(String),

    /// A probe sequence ran into a slot or record that cannot be decoded
    /// while writing a term that may lie beyond it.
    #[error("Corrupt dictionary slot at byte offset {slot}")]
    CorruptDictionary { slot: u64 },

    /// Caller supplied an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A named resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl LexisError {
    pub fn index<S: Into<String>>(msg: S) -> Self {
        LexisError::Index(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LexisError::InvalidArgument(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LexisError::InvalidConfig(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        LexisError::NotFound(msg.into())
    }
}
