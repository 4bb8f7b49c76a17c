//! Bootstrap configuration loading
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. `VIBE_CONFIG` environment variable
//! 3. Platform config directory (`<config dir>/vibe/config.toml`)
//! 4. Built-in defaults
//!
//! A missing config file is not fatal: a warning is logged and the built-in
//! defaults are used. `VIBE_API_URL` overrides `api_url` after the file is read.

use crate::api::Tunables;
use crate::{Error, Result, DEFAULT_FINE_TUNE_CAPACITY, HIDDEN_ARTIST_LIMIT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "VIBE_CONFIG";

/// Environment variable overriding the service base URL
pub const ENV_API_URL: &str = "VIBE_API_URL";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the recommendation service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Exclusion history size at which regeneration is disabled
    #[serde(default = "default_hidden_artist_limit")]
    pub hidden_artist_limit: usize,

    /// Maximum fine-tune tracks per artist
    #[serde(default = "default_fine_tune_capacity")]
    pub fine_tune_capacity: usize,

    /// Assume a player is ready after this long without a ready signal
    #[serde(default = "default_ready_fallback_ms")]
    pub ready_fallback_ms: u64,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default request weights
    #[serde(default)]
    pub tunables: Tunables,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_hidden_artist_limit() -> usize {
    HIDDEN_ARTIST_LIMIT
}

fn default_fine_tune_capacity() -> usize {
    DEFAULT_FINE_TUNE_CAPACITY
}

fn default_ready_fallback_ms() -> u64 {
    3_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
            hidden_artist_limit: default_hidden_artist_limit(),
            fine_tune_capacity: default_fine_tune_capacity(),
            ready_fallback_ms: default_ready_fallback_ms(),
            logging: LoggingConfig::default(),
            tunables: Tunables::default(),
        }
    }
}

impl TomlConfig {
    /// Resolve, read and validate the configuration
    ///
    /// `cli_path` is the `--config` argument, if any.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Self::default()
            }
            None => {
                warn!("No config location available, using built-in defaults");
                Self::default()
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without applying environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(ENV_API_URL) {
            if !value.trim().is_empty() {
                self.api_url = value.trim().to_string();
            }
        }
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        if self.hidden_artist_limit == 0 {
            return Err(Error::Config("hidden_artist_limit must be at least 1".to_string()));
        }
        if self.fine_tune_capacity == 0 {
            return Err(Error::Config("fine_tune_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ready_fallback(&self) -> Duration {
        Duration::from_millis(self.ready_fallback_ms)
    }
}

/// Pick the config file location by priority
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(value) = std::env::var_os(ENV_CONFIG_PATH) {
        if !value.is_empty() {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Some(path.join(CONFIG_FILE_NAME));
            }
            return Some(path);
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir().map(|d| d.join("vibe").join(CONFIG_FILE_NAME))
}
