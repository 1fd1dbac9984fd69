//! Option resolution: CLI flags, config-file sections, built-in defaults.
//!
//! Precedence is flag > file > default. Every resolved option lives in a
//! section of the TOML config file named after the component it
//! configures (`[ledger]`, `[sensor]`, `[mam]`, `[buffer]`); missing
//! required values fail fast with a message naming both the flag and the
//! config key.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use tanglefeed_ledger::LedgerConfig;
use tanglefeed_mam::MamConfig;
use tanglefeed_sensor::SensorConfig;

/// Default node to attach transactions through.
pub const DEFAULT_NODE: &str = "http://localhost:14265/";
/// Default price tag attached to a bundle.
pub const DEFAULT_PRICE: f64 = 0.0;
/// Default buffer threshold: flush every single reading.
pub const DEFAULT_BUFFER_SIZE: usize = 0;

/// Errors raised while resolving the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("there was a problem reading the configuration file \"{}\": {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file \"{}\" is not valid TOML: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "couldn't find a suitable `{key}` to use. Specify it via the `--{flag}` option or \
         set the `{key}` variable under the [{section}] section of your configuration file"
    )]
    Missing {
        flag: String,
        section: String,
        key: String,
    },
}

/// Command-line flags. Everything except `--config` and `--verbose` can
/// alternatively come from the config file.
#[derive(Parser, Debug, Default)]
#[command(
    name = "tanglefeed",
    about = "Read public weather-sensor data, tag it with a price and attach it as \
             encrypted transactions to the Tangle."
)]
pub struct Args {
    /// Configuration file to read options from.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Node to connect to (defaults to http://localhost:14265/).
    #[arg(long)]
    pub node: Option<String>,

    /// Seed owning the MAM channel.
    #[arg(long)]
    pub seed: Option<String>,

    /// Price value to attach to the data.
    #[arg(long)]
    pub price: Option<f64>,

    /// Depth at which to attach the resulting transactions.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Min weight magnitude, used by the node to calibrate PoW.
    #[arg(long)]
    pub min_weight_magnitude: Option<u32>,

    /// client_id used to connect to the sensor API.
    #[arg(long)]
    pub client_id: Option<String>,

    /// client_secret used to connect to the sensor API.
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Username used to connect to the sensor API.
    #[arg(long)]
    pub username: Option<String>,

    /// Password used to connect to the sensor API.
    #[arg(long)]
    pub password: Option<String>,

    /// Index of the first key used to encrypt the message.
    #[arg(long)]
    pub start: Option<u32>,

    /// Number of keys in the schedule.
    #[arg(long)]
    pub count: Option<u32>,

    /// Index of the key used to establish the channel.
    #[arg(long)]
    pub channel_key_index: Option<u32>,

    /// Security level of the resulting transactions.
    #[arg(long)]
    pub security_level: Option<u32>,

    /// Path to the MAM encryption helper executable.
    #[arg(long)]
    pub mam_encrypt_path: Option<PathBuf>,

    /// How many readings to buffer locally before attaching them as a
    /// single chunk (defaults to 0: send every reading).
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Directory the buffered readings are stored in.
    #[arg(long)]
    pub buffer_directory: Option<PathBuf>,

    /// Enable verbose debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub ledger: LedgerSection,
    pub sensor: SensorSection,
    pub mam: MamSection,
    pub buffer: BufferSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    pub node: Option<String>,
    pub seed: Option<String>,
    pub price: Option<f64>,
    pub depth: Option<u32>,
    pub min_weight_magnitude: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SensorSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MamSection {
    pub start: Option<u32>,
    pub count: Option<u32>,
    pub channel_key_index: Option<u32>,
    pub security_level: Option<u32>,
    pub mam_encrypt_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BufferSection {
    pub size: Option<usize>,
    pub directory: Option<PathBuf>,
}

impl FileConfig {
    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Fully resolved configuration for one pipeline run.
#[derive(Debug)]
pub struct Settings {
    pub ledger: LedgerConfig,
    pub seed: String,
    pub price: f64,
    pub sensor: SensorConfig,
    pub mam: MamConfig,
    pub buffer_size: usize,
    pub buffer_directory: PathBuf,
}

impl Settings {
    /// Merges flags with the config file (if any) and the defaults.
    pub fn resolve(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let ledger = LedgerConfig {
            node: args
                .node
                .or(file.ledger.node)
                .unwrap_or_else(|| DEFAULT_NODE.to_string()),
            depth: require(args.depth.or(file.ledger.depth), "depth", "ledger", "depth")?,
            min_weight_magnitude: require(
                args.min_weight_magnitude.or(file.ledger.min_weight_magnitude),
                "min-weight-magnitude",
                "ledger",
                "min_weight_magnitude",
            )?,
        };

        let sensor = SensorConfig {
            client_id: require(
                args.client_id.or(file.sensor.client_id),
                "client-id",
                "sensor",
                "client_id",
            )?,
            client_secret: require(
                args.client_secret.or(file.sensor.client_secret),
                "client-secret",
                "sensor",
                "client_secret",
            )?,
            username: require(
                args.username.or(file.sensor.username),
                "username",
                "sensor",
                "username",
            )?,
            password: require(
                args.password.or(file.sensor.password),
                "password",
                "sensor",
                "password",
            )?,
            base_url: file
                .sensor
                .base_url
                .unwrap_or_else(|| SensorConfig::DEFAULT_BASE_URL.to_string()),
        };

        let mam = MamConfig {
            start: require(args.start.or(file.mam.start), "start", "mam", "start")?,
            count: require(args.count.or(file.mam.count), "count", "mam", "count")?,
            channel_key_index: require(
                args.channel_key_index.or(file.mam.channel_key_index),
                "channel-key-index",
                "mam",
                "channel_key_index",
            )?,
            security_level: require(
                args.security_level.or(file.mam.security_level),
                "security-level",
                "mam",
                "security_level",
            )?,
            encrypt_path: require(
                args.mam_encrypt_path.or(file.mam.mam_encrypt_path),
                "mam-encrypt-path",
                "mam",
                "mam_encrypt_path",
            )?,
        };

        Ok(Self {
            ledger,
            seed: require(args.seed.or(file.ledger.seed), "seed", "ledger", "seed")?,
            price: args.price.or(file.ledger.price).unwrap_or(DEFAULT_PRICE),
            sensor,
            mam,
            buffer_size: args
                .buffer_size
                .or(file.buffer.size)
                .unwrap_or(DEFAULT_BUFFER_SIZE),
            buffer_directory: require(
                args.buffer_directory.or(file.buffer.directory),
                "buffer-directory",
                "buffer",
                "directory",
            )?,
        })
    }
}

fn require<T>(value: Option<T>, flag: &str, section: &str, key: &str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::Missing {
        flag: flag.to_string(),
        section: section.to_string(),
        key: key.to_string(),
    })
}
