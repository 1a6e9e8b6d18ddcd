//! Error types for persistence operations.

use std::path::PathBuf;

use sheetbot_core::StoreError;
use thiserror::Error;

/// Errors that can occur while reading or writing state files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Could not create a directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a file.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

impl From<PersistenceError> for StoreError {
    fn from(e: PersistenceError) -> Self {
        let message = e.to_string();
        match e {
            // Keep the io kind, but carry the path in the message.
            PersistenceError::DirectoryError { source, .. }
            | PersistenceError::ReadError { source, .. }
            | PersistenceError::WriteError { source, .. } => {
                StoreError::Io(std::io::Error::new(source.kind(), message))
            }
            _ => StoreError::Backend(message),
        }
    }
}
