//! Error types for the buffer crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur while operating on the buffer directory.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Invalid construction parameters (bad directory path).
    #[error("invalid buffer configuration: {0}")]
    Config(String),

    /// Filesystem operation failed.
    #[error("buffer I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A buffered record is not valid UTF-8 JSON.
    #[error("corrupt buffered record {}: {source}", path.display())]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Another process holds the buffer lock.
    #[error("buffer directory {} is locked by another process", .0.display())]
    Locked(PathBuf),
}

impl BufferError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BufferError::Io {
            path: path.into(),
            source,
        }
    }
}
