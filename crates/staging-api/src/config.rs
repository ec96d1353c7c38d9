//! # Service Configuration
//!
//! Loaded once at startup and passed explicitly into the application
//! state and the storage collaborator. Nothing reads the environment
//! after [`AppConfig::from_env`] returns.

use std::path::PathBuf;
use std::str::FromStr;

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Runtime configuration for the staging API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Directory holding one subdirectory per stage.
    pub staging_root: PathBuf,
    pub log_format: LogFormat,
    /// Whether `/metrics` and the request-metrics middleware are mounted.
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// A configuration with defaults for everything but the staging root.
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            port: 8080,
            staging_root: staging_root.into(),
            log_format: LogFormat::Text,
            metrics_enabled: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `STAGING_ENV_PATH` (required)
    /// - `PORT` (default: 8080)
    /// - `LOG_FORMAT`: `text` or `json` (default: `text`)
    /// - `STAGING_METRICS_ENABLED` (default: true; only `false` disables)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let staging_root = lookup("STAGING_ENV_PATH")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingStagingRoot)?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => 8080,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let metrics_enabled = lookup("STAGING_METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Ok(Self {
            port,
            staging_root: PathBuf::from(staging_root),
            log_format,
            metrics_enabled,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("STAGING_ENV_PATH environment variable is required")]
    MissingStagingRoot,
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("invalid LOG_FORMAT {0:?}, expected 'text' or 'json'")]
    InvalidLogFormat(String),
}
