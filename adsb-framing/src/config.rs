//! Configuration file management for adsb-client.
//!
//! Reads/writes `~/.adsb-client/config.toml` with the source address, wire
//! format, and connection timing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frame::FrameFormat;
use crate::types::{FramingError, Result};

/// Everything needed to build one stream client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub format: FrameFormat,
    /// Upper bound on a single connect attempt.
    pub connect_timeout_secs: u64,
    /// Wait between failed connect attempts.
    pub reconnect_delay_secs: u64,
    /// Maximum bytes per socket read.
    pub read_chunk_size: usize,
    /// Pause after handing a batch of messages to the handler.
    pub pause_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".into(),
            port: 30005,
            format: FrameFormat::Beast,
            connect_timeout_secs: 10,
            reconnect_delay_secs: 3,
            read_chunk_size: 1024,
            pause_ms: 1,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, format: FrameFormat) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            format,
            ..ClientConfig::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(FramingError::Config("host must not be empty".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(FramingError::Config(
                "read_chunk_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Get the config directory path (`~/.adsb-client/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".adsb-client")
}

/// Get the default config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Parse and validate TOML config text. Missing keys take their defaults.
pub fn parse_config(text: &str) -> Result<ClientConfig> {
    let config: ClientConfig =
        toml::from_str(text).map_err(|e| FramingError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`. Returns the default config if it doesn't exist.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Save config to `path`, creating parent directories.
pub fn save_config(config: &ClientConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let text = toml::to_string(config).map_err(|e| FramingError::Config(e.to_string()))?;
    std::fs::write(path, format!("# adsb-client configuration\n\n{text}"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
