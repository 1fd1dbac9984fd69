//! Subprocess-backed channel encryption.
//!
//! MAM encryption is delegated to an external helper executable (the
//! reference JS implementation). The helper takes the channel seed and
//! the plaintext message as positional arguments plus the key-schedule
//! flags, and prints a JSON array of tryte strings on stdout.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tanglefeed_ledger::TryteString;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MamError, MamResult};

/// Key-schedule parameters and helper location.
#[derive(Debug, Clone)]
pub struct MamConfig {
    /// Index of the first key used to encrypt the message.
    pub start: u32,
    /// Number of keys in the schedule.
    pub count: u32,
    /// Index of the key used to establish the channel.
    pub channel_key_index: u32,
    /// Security level of the resulting transactions.
    pub security_level: u32,
    /// Path to the encryption helper executable.
    pub encrypt_path: PathBuf,
}

/// A pluggable message-encryption capability: plaintext plus key-schedule
/// parameters in, ledger-ready encoded units out.
///
/// The orchestrator only depends on this trait, so a native
/// implementation can replace the subprocess later without touching it.
#[async_trait]
pub trait MessageEncrypter: Send + Sync {
    /// Encrypts `message` for the channel owned by `seed`.
    async fn encrypt(&self, seed: &str, message: &str) -> MamResult<Vec<TryteString>>;
}

/// [`MessageEncrypter`] that shells out to the configured helper.
#[derive(Debug)]
pub struct MamCliEncrypter {
    config: MamConfig,
}

impl MamCliEncrypter {
    /// Wraps the configured helper executable.
    pub fn new(config: MamConfig) -> MamResult<Self> {
        if config.encrypt_path.as_os_str().is_empty() {
            return Err(MamError::Config(
                "encryption helper path must not be empty".into(),
            ));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl MessageEncrypter for MamCliEncrypter {
    async fn encrypt(&self, seed: &str, message: &str) -> MamResult<Vec<TryteString>> {
        debug!(
            helper = %self.config.encrypt_path.display(),
            bytes = message.len(),
            "invoking encryption helper"
        );

        let output = Command::new(&self.config.encrypt_path)
            .arg(seed)
            .arg(message)
            .arg("--channel-key-index")
            .arg(self.config.channel_key_index.to_string())
            .arg("--start")
            .arg(self.config.start.to_string())
            .arg("--count")
            .arg(self.config.count.to_string())
            .arg("--security-level")
            .arg(self.config.security_level.to_string())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MamError::Spawn {
                path: self.config.encrypt_path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(MamError::Helper {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let encoded: Vec<String> = serde_json::from_slice(&output.stdout)
            .map_err(|e| MamError::InvalidOutput(format!("not a JSON string array: {e}")))?;
        if encoded.is_empty() {
            return Err(MamError::InvalidOutput(
                "helper produced no transaction trytes".into(),
            ));
        }

        encoded
            .into_iter()
            .map(|unit| {
                if !unit.is_ascii() {
                    return Err(MamError::InvalidOutput(
                        "helper output contains non-ASCII text".into(),
                    ));
                }
                TryteString::new(unit).map_err(|e| MamError::InvalidOutput(e.to_string()))
            })
            .collect()
    }
}
