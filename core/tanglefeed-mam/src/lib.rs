//! Channel encryption for tanglefeed.
//!
//! The bundle handed to the ledger is first transformed into masked
//! authenticated messages. The actual cryptography lives in an external
//! helper program; this crate wraps it behind the [`MessageEncrypter`]
//! trait so the pipeline never depends on the subprocess directly.

mod encrypter;
mod error;

pub use encrypter::{MamCliEncrypter, MamConfig, MessageEncrypter};
pub use error::{MamError, MamResult};
