//! Configuration file loading.
//!
//! `chessdna.toml` in the working directory supplies defaults for the
//! `analyze` command. Every field is optional and command-line flags win.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct ChessDnaConfig {
    /// Engine binary. Falls back to `STOCKFISH_PATH`, then `stockfish`.
    #[serde(default)]
    pub engine_path: Option<String>,
    /// Seconds per search, clamped to [0.01, 1.0].
    #[serde(default)]
    pub time_per_move: Option<f64>,
    /// Ply cap per game, clamped to [10, 800].
    #[serde(default)]
    pub max_plies: Option<i64>,
    /// Player to report on.
    #[serde(default)]
    pub player: Option<String>,
    /// Kill the engine after this many silent seconds.
    #[serde(default)]
    pub hard_timeout_secs: Option<f64>,
}

impl ChessDnaConfig {
    /// Loads the configuration from [`Self::config_path()`], or defaults if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns `chessdna.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chessdna.toml")
    }
}

/// Seconds to a timeout; zero, negative and non-finite values mean none.
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|timeout| !timeout.is_zero())
}
