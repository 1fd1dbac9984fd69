//! Wiring for the `tanglefeed` binary: option resolution and the
//! fetch → buffer → encrypt → attach pipeline.

pub mod config;
pub mod pipeline;

pub use config::{Args, ConfigError, FileConfig, Settings};
pub use pipeline::{run, run_with_encrypter, RunOutcome};
