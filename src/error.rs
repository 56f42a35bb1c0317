//! Centralized error types for replysplit.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the replysplit library.
///
/// Body segmentation never fails; these cover the I/O and input-shape
/// problems of the collaborators around it.
#[derive(Error, Debug)]
pub enum ReplyError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("CSV export not found: {0}")]
    FileNotFound(PathBuf),

    /// The CSV has no header record at all.
    #[error("CSV export is empty: {0}")]
    EmptyInput(PathBuf),

    /// A required column is missing from the CSV header.
    #[error("Required column '{column}' missing from header of '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    /// A thread selection could not be resolved.
    #[error("Invalid thread selection: {0}")]
    InvalidSelection(String),

    /// An export operation failed.
    #[error("Export error: {0}")]
    Export(String),

    /// A single case entry could not be submitted.
    #[error("Submission error: {0}")]
    Submission(String),
}

/// Convenience alias for `Result<T, ReplyError>`.
pub type Result<T> = std::result::Result<T, ReplyError>;

impl ReplyError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (prefer `ReplyError::io`).
impl From<std::io::Error> for ReplyError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
