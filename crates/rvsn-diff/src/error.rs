//! Diff error types.

use thiserror::Error;

/// Result type for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors that can occur while applying an edit script.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    /// An instruction could not be parsed or does not fit the original text.
    #[error("malformed edit script at line {line}: {reason}")]
    MalformedScript { line: usize, reason: String },
}

impl DiffError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedScript {
            line,
            reason: reason.into(),
        }
    }
}
