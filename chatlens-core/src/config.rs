//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatlens/` (~/.config/chatlens/)
//! - Data: `$XDG_DATA_HOME/chatlens/` (~/.local/share/chatlens/)
//! - State/Logs: `$XDG_STATE_HOME/chatlens/` (~/.local/state/chatlens/)
//!
//! The data directory holds the extracted snapshot (`messages.bin`) and the
//! per-chat preview pages (`previews/`). The identity map defaults to
//! `id_map.toml` next to the config file, where the user is already editing.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Raw message store location
    #[serde(default)]
    pub source: SourceConfig,

    /// Load-time defaults (timezone, identity map)
    #[serde(default)]
    pub load: LoadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Raw message store configuration
#[derive(Debug, Deserialize, Default)]
pub struct SourceConfig {
    /// Override path to the store file. Defaults to the well-known
    /// `~/Library/Messages/chat.db` location.
    pub store_path: Option<PathBuf>,
}

/// Load-time configuration
#[derive(Debug, Deserialize, Default)]
pub struct LoadConfig {
    /// IANA timezone name for `date_local` (e.g. "US/Pacific").
    /// Unset means the system-local zone.
    pub timezone: Option<String>,

    /// Override path to the identity map document
    pub map_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Effective store path: the configured override, or the well-known
    /// Apple Messages location.
    pub fn store_path(&self) -> PathBuf {
        self.source
            .store_path
            .clone()
            .unwrap_or_else(Self::default_store_path)
    }

    /// Effective identity map path: the configured override, or
    /// `id_map.toml` next to the config file.
    pub fn map_path(&self) -> PathBuf {
        self.load.map_path.clone().unwrap_or_else(Self::default_map_path)
    }

    /// The well-known Apple Messages store location
    ///
    /// `~/Library/Messages/chat.db`
    pub fn default_store_path() -> PathBuf {
        home_dir().join("Library/Messages/chat.db")
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatlens/config.toml` (~/.config/chatlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatlens").join("config.toml")
    }

    /// Returns the default identity map path
    ///
    /// `$XDG_CONFIG_HOME/chatlens/id_map.toml` (~/.config/chatlens/id_map.toml)
    pub fn default_map_path() -> PathBuf {
        xdg_config_home().join("chatlens").join("id_map.toml")
    }

    /// Returns the data directory path (snapshot and previews)
    ///
    /// `$XDG_DATA_HOME/chatlens/` (~/.local/share/chatlens/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("chatlens")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/chatlens/` (~/.local/state/chatlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatlens")
    }

    /// Returns the flat table snapshot path
    ///
    /// `$XDG_DATA_HOME/chatlens/messages.bin`
    pub fn snapshot_path() -> PathBuf {
        Self::data_dir().join("messages.bin")
    }

    /// Returns the per-chat preview directory
    ///
    /// `$XDG_DATA_HOME/chatlens/previews/`
    pub fn preview_dir() -> PathBuf {
        Self::data_dir().join("previews")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/chatlens/chatlens.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("chatlens.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
