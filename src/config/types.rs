//! Core configuration types and loading.

use super::defaults::{default_data_directory, default_hops, default_log_level};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use ssb_proto::{Hops, MessageHmac};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file inside a config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the database file inside the data directory.
pub const DATABASE_FILE: &str = "pubd.redb";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where the database lives. Relative paths are resolved against the
    /// config directory.
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    /// How far the social graph is expanded from the pub identity.
    #[serde(default = "default_hops")]
    pub hops: u32,
    /// Base64 32-byte key mixed into message signatures. Only set this on
    /// test networks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_hmac: Option<String>,
    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            hops: default_hops(),
            message_hmac: None,
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the database file for a config stored in `config_dir`.
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        let dir = if self.data_directory.is_absolute() {
            self.data_directory.clone()
        } else {
            config_dir.join(&self.data_directory)
        };
        dir.join(DATABASE_FILE)
    }

    pub fn hops(&self) -> Hops {
        Hops::new(self.hops)
    }

    /// Decode the message HMAC key, if one is configured.
    pub fn message_hmac(&self) -> Result<Option<MessageHmac>, ConfigError> {
        let Some(encoded) = &self.message_hmac else {
            return Ok(None);
        };
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::Invalid(format!("message_hmac: {}", e)))?;
        MessageHmac::from_bytes(&bytes)
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("message_hmac: {}", e)))
    }
}
