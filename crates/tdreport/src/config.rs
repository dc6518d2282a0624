//! Configuration management for tdreport.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "tdreport";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "TDREPORT_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TDREPORT_`, sections split by `__`)
/// 2. TOML config file at `~/.config/tdreport/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Directory holding the static form assets.
    pub public_dir: PathBuf,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where submitted reports are written.
    pub reports_dir: PathBuf,
    /// Directory for the daily activity log files.
    pub logs_dir: PathBuf,
    /// Skip malformed report files when listing instead of failing the
    /// whole listing.
    pub skip_invalid_reports: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            max_body_bytes: 100 * 1024,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("laporan"),
            logs_dir: PathBuf::from("logs"),
            skip_invalid_reports: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `TDREPORT_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "server.host must not be empty".to_string(),
            });
        }

        if self.server.max_body_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "server.max_body_bytes must be greater than 0".to_string(),
            });
        }

        for (key, path) in [
            ("server.public_dir", &self.server.public_dir),
            ("storage.reports_dir", &self.storage.reports_dir),
            ("storage.logs_dir", &self.storage.logs_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{key} must not be empty"),
                });
            }
        }

        Ok(())
    }

    /// The `host:port` pair the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
