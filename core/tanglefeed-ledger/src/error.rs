//! Error types for the ledger client.

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur while talking to a ledger node.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid client configuration.
    #[error("invalid ledger configuration: {0}")]
    Config(String),

    /// Text that is not drawn from the tryte alphabet.
    #[error("invalid tryte string: {0}")]
    InvalidTrytes(String),

    /// The node rejected or failed a command.
    #[error("node command {command} failed: {detail}")]
    Api { command: String, detail: String },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
