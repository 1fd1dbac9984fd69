//! Error types for the sensor client.

use thiserror::Error;

/// Result type for sensor operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors that can occur while fetching sensor readings.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Invalid client configuration.
    #[error("invalid sensor configuration: {0}")]
    Config(String),

    /// Credential exchange failed or no usable token is held.
    #[error("sensor authentication failed: {0}")]
    Auth(String),

    /// The provider answered with a non-success status; the parsed error
    /// body is attached.
    #[error("sensor API returned {status}: {body}")]
    Api {
        status: u16,
        body: serde_json::Value,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
