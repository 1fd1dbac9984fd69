//! Durable on-disk buffering for tanglefeed.
//!
//! Sensor readings are accumulated as individual files in a buffer
//! directory until a configured count is reached, then drained as a batch
//! and cleared. The directory's contents are the only state, so an
//! interrupted run resumes exactly where it left off.
//!
//! # Durability model
//!
//! - `add` is atomic: payloads are written to a temporary sibling and
//!   renamed into place, so readers never see a half-written record.
//! - `read` is purely observational and aborts on the first corrupt
//!   record rather than silently dropping data.
//! - `clear` only runs after a successful downstream submission, which
//!   gives the pipeline at-least-once delivery: a failed run leaves the
//!   records for the next invocation to retry.
//! - An advisory file lock serializes whole runs against the same
//!   directory.

mod buffer;
mod error;
mod lock;

pub use buffer::Buffer;
pub use error::{BufferError, BufferResult};
pub use lock::{BufferLock, LOCK_FILE_NAME};
