//! Ledger submission for tanglefeed.
//!
//! Defines the validated [`TryteString`] payload type and a thin HTTP
//! client that drives a node's attach/broadcast/store command sequence.
//! Proof-of-work parameters (`depth`, `min_weight_magnitude`) are passed
//! through to the node opaquely.

mod client;
mod error;
mod trytes;

pub use client::{LedgerClient, LedgerConfig};
pub use error::{LedgerError, LedgerResult};
pub use trytes::{TryteString, TRYTE_ALPHABET};
