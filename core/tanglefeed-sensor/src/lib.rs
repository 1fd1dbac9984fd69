//! Sensor-data retrieval for tanglefeed.
//!
//! One credential exchange, then one public-data fetch per pipeline run.
//! Token state lives on the client instance, never in process globals.

mod client;
mod error;

pub use client::{PublicDataQuery, SensorClient, SensorConfig};
pub use error::{SensorError, SensorResult};
