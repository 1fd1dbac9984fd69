//! Error types for the encryption capability.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for encryption operations.
pub type MamResult<T> = Result<T, MamError>;

/// Errors that can occur while encrypting a message for the channel.
#[derive(Debug, Error)]
pub enum MamError {
    /// Invalid encrypter configuration.
    #[error("invalid MAM configuration: {0}")]
    Config(String),

    /// The helper executable could not be started.
    #[error("failed to run encryption helper {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The helper ran but exited unsuccessfully.
    #[error("encryption helper exited with status {status}: {stderr}")]
    Helper { status: i32, stderr: String },

    /// The helper's output was not a JSON array of tryte strings.
    #[error("encryption helper produced unusable output: {0}")]
    InvalidOutput(String),
}
