//! Configuration management for the monitor
//!
//! Loads configuration from config.toml at startup.
//! All values are configurable to avoid hardcoded constants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::feed::BackoffSchedule;

/// Environment variable overriding `stream.url`
pub const URL_ENV: &str = "MONITOR_WS_URL";

/// Environment variable pointing at the config file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Monitor configuration
///
/// Loaded from config.toml at startup. Missing sections use defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Feed connection and admission settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// API server settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Feed ingestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Feed endpoint (ws:// or wss://). Required.
    #[serde(default)]
    pub url: String,

    /// Delays between reconnect attempts; holds at the last entry
    #[serde(default = "default_backoff_ms")]
    pub reconnect_backoff_ms: Vec<u64>,

    /// Cadence of paced admissions into the visible buffer
    #[serde(default = "default_throttle_interval_ms")]
    pub throttle_interval_ms: u64,

    /// Maximum number of visible events
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// WebSocket handshake timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Depth of the manager → admission worker channel
    #[serde(default = "default_command_queue")]
    pub command_queue: usize,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Serve the status API at all
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Optional static files directory served as fallback
    #[serde(default)]
    pub static_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write the main log file as JSON lines
    #[serde(default = "default_log_json")]
    pub json: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_backoff_ms: default_backoff_ms(),
            throttle_interval_ms: default_throttle_interval_ms(),
            buffer_capacity: default_buffer_capacity(),
            connect_timeout_secs: default_connect_timeout_secs(),
            command_queue: default_command_queue(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            port: default_api_port(),
            static_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            level: default_log_level(),
            json: default_log_json(),
        }
    }
}

fn default_backoff_ms() -> Vec<u64> {
    vec![1000, 2000, 5000]
}

fn default_throttle_interval_ms() -> u64 {
    1500
}

fn default_buffer_capacity() -> usize {
    50
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_command_queue() -> usize {
    1024
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_port() -> u16 {
    5000
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_json() -> bool {
    true
}

impl StreamConfig {
    /// Backoff schedule; an empty list falls back to the default
    pub fn backoff_schedule(&self) -> BackoffSchedule {
        BackoffSchedule::from_millis(&self.reconnect_backoff_ms).unwrap_or_default()
    }

    #[inline]
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the file named by `CONFIG_PATH` (default
    /// config.toml), then apply environment overrides.
    ///
    /// If the file doesn't exist, defaults are used.
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.stream.url = url.trim().to_string();
        }
    }

    /// Check everything the monitor needs before starting
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stream = &self.stream;

        if stream.url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "stream.url is required (or set {})",
                URL_ENV
            )));
        }
        let url = url::Url::parse(&stream.url)
            .map_err(|e| ConfigError::Invalid(format!("stream.url is not a valid URL: {}", e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "stream.url must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }

        if stream.reconnect_backoff_ms.is_empty() {
            return Err(ConfigError::Invalid(
                "stream.reconnect_backoff_ms must not be empty".to_string(),
            ));
        }
        if stream.throttle_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "stream.throttle_interval_ms must be greater than 0".to_string(),
            ));
        }
        if stream.buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "stream.buffer_capacity must be greater than 0".to_string(),
            ));
        }
        if stream.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "stream.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid TOML
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Parsed but unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}
