//! Configuration for mindful-minutes.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON records file backing the in-memory store
    pub records_path: PathBuf,

    /// Path for storing the read-access log
    pub data_path: PathBuf,

    /// IANA timezone used for "today" (system zone when unset)
    #[serde(default)]
    pub timezone: Option<String>,

    /// Window used when neither `--today` nor an explicit range is given
    #[serde(default)]
    pub default_scope: Scope,

    /// Remote health gateway, if one is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteSettings>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindful-minutes");

        Self {
            records_path: data_dir.join("records.json"),
            data_path: data_dir,
            timezone: None,
            default_scope: Scope::All,
            remote: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindful-minutes")
            .join("config.json")
    }

    /// Path of the persisted read-access log.
    pub fn access_log_path(&self) -> PathBuf {
        self.data_path.join("access.json")
    }

    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Option<Tz>, ConfigError> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| ConfigError::InvalidTimezone(name.to_string()))
            })
            .transpose()
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Which records a query covers by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every record ever stored
    #[default]
    All,
    /// Records since the start of the local day
    Today,
}

impl std::str::FromStr for Scope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Scope::All),
            "today" => Ok(Scope::Today),
            other => Err(ConfigError::ParseError(format!("Unknown scope '{other}'"))),
        }
    }
}

/// Connection settings for a remote health gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub token: String,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidTimezone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
        }
    }
}

impl std::error::Error for ConfigError {}
