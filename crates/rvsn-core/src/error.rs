//! Error types for the version control engine.

use rvsn_diff::DiffError;
use rvsn_storage::StorageError;
use thiserror::Error;

/// Result type for repository operations.
pub type RvsnResult<T> = Result<T, RvsnError>;

/// Coarse classification of failures reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown path, commit or identity.
    NotFound,
    /// An underlying read, write, create or delete failed.
    IoFailure,
    /// Stored data is inconsistent (missing or unreadable delta chain, id collision).
    InvalidState,
}

/// Errors that can occur in the version control engine.
#[derive(Debug, Error)]
pub enum RvsnError {
    /// A path, commit or identity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error in the working tree.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is inconsistent.
    #[error("Invalid repository state: {0}")]
    InvalidState(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A stored edit script could not be applied.
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The repository configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RvsnError {
    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The kind of failure this error represents.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::Io(_) | Self::Storage(_) | Self::Json(_) => ErrorKind::IoFailure,
            Self::InvalidState(_) | Self::Diff(_) | Self::Config(_) => ErrorKind::InvalidState,
        }
    }
}
