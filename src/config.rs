//! Configuration module for AlumniConnect.

use serde::Deserialize;
use std::path::Path;

use crate::{AlumniError, Result};

/// Which data service implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The hosted service over HTTP.
    #[default]
    Rest,
    /// The in-process service (local development and demos).
    Memory,
}

/// Remote data service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: Backend,
    /// Base URL of the hosted service.
    #[serde(default)]
    pub url: String,
    /// Public (anonymous) api key.
    #[serde(default)]
    pub anon_key: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// File used to persist the session token between runs.
    #[serde(default)]
    pub session_file: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: default_timeout(),
            session_file: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Remote data service configuration.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AlumniError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AlumniError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `ALUMNI_REMOTE_URL`: Override the data service URL
    /// - `ALUMNI_ANON_KEY`: Override the public api key
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ALUMNI_REMOTE_URL") {
            if !url.is_empty() {
                self.remote.url = url;
            }
        }
        if let Ok(key) = std::env::var("ALUMNI_ANON_KEY") {
            if !key.is_empty() {
                self.remote.anon_key = key;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the REST backend is selected without a URL or api key.
    pub fn validate(&self) -> Result<()> {
        if self.remote.backend == Backend::Rest {
            if self.remote.url.is_empty() {
                return Err(AlumniError::Config(
                    "remote.url is not set. \
                     Set it in config.toml or via ALUMNI_REMOTE_URL environment variable."
                        .to_string(),
                ));
            }
            if self.remote.anon_key.is_empty() {
                return Err(AlumniError::Config(
                    "remote.anon_key is not set. \
                     Set it in config.toml or via ALUMNI_ANON_KEY environment variable."
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}
