//! Error types for the resource cache.

use thiserror::Error;

/// Main error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corrupted collection {key:?}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid medium format: {0}")]
    InvalidFormat(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Medium is locked by another process")]
    Locked,

    #[error("Medium not initialized")]
    NotInitialized,
}

impl CacheError {
    /// Whether this error means the stored bytes for a key are unreadable,
    /// as opposed to the medium itself being unavailable.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CacheError::Corrupted { .. }
                | CacheError::Deserialization(_)
                | CacheError::InvalidFormat(_)
                | CacheError::ChecksumMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
