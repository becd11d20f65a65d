//! Storage error types.

use std::sync::PoisonError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures of a storage backend. A missing key is not one of them: reads
/// report it as `None`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("Stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty keys and components that could leave the storage root.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// The in-memory backend's lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    pub(crate) fn poisoned<T>(err: PoisonError<T>) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}
