//! Runtime configuration for the orchestration core.
//!
//! Configuration is read from a TOML document and may be overridden by a
//! small set of environment variables so deployments can inject secrets
//! without rewriting files:
//!
//! ```toml
//! [database]
//! url = "postgres://atelier@localhost/atelier"
//! pool_max_size = 8
//!
//! [sandbox]
//! gateway_base_url = "http://sandbox-gateway:8080"
//! api_token = "secret"
//! request_timeout_secs = 10
//! connect_timeout_secs = 10
//!
//! [sweep]
//! stale_after_secs = 1800
//! interval_secs = 60
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`DatabaseConfig::url`].
pub const DATABASE_URL_ENV: &str = "ATELIER_DATABASE_URL";
/// Environment variable overriding [`SandboxGatewayConfig::gateway_base_url`].
pub const SANDBOX_GATEWAY_URL_ENV: &str = "ATELIER_SANDBOX_GATEWAY_URL";
/// Environment variable overriding [`SandboxGatewayConfig::api_token`].
pub const SANDBOX_API_TOKEN_ENV: &str = "ATELIER_SANDBOX_API_TOKEN";

/// Errors returned while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: Arc<std::io::Error>,
    },

    /// The document is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Relational store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Sandbox gateway settings.
    #[serde(default)]
    pub sandbox: SandboxGatewayConfig,
    /// Stale-task sweep settings.
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Relational store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    #[serde(default)]
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

/// Sandbox gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxGatewayConfig {
    /// Base URL of the gateway HTTP API, e.g. `http://gateway:8080`.
    #[serde(default)]
    pub gateway_base_url: String,
    /// Token sent with every gateway request, if any.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Timeout for gateway HTTP requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for establishing a sandbox WebSocket session, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl SandboxGatewayConfig {
    /// Returns the gateway HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the WebSocket connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for SandboxGatewayConfig {
    fn default() -> Self {
        Self {
            gateway_base_url: String::new(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Stale-task sweep settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// A running task idle for longer than this many seconds is stale.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Delay between sweeps, in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl SweepConfig {
    /// Returns the idle period after which a running task is stale.
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Returns the delay between sweeps.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl OrchestratorConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Reads a TOML file, applies environment overrides and validates the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or when
    /// the merged configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(err),
        })?;
        let config = Self::from_toml_str(&document)?.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Replaces values with those from the `ATELIER_*` environment variables
    /// that are set and non-empty.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(DATABASE_URL_ENV) {
            self.database.url = url;
        }
        if let Some(url) = non_empty_env(SANDBOX_GATEWAY_URL_ENV) {
            self.sandbox.gateway_base_url = url;
        }
        if let Some(token) = non_empty_env(SANDBOX_API_TOKEN_ENV) {
            self.sandbox.api_token = Some(token);
        }
        self
    }

    /// Checks that required values are present and usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must be set".to_owned()));
        }
        if self.database.pool_max_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_max_size must be positive".to_owned(),
            ));
        }
        let base_url = self.sandbox.gateway_base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "sandbox.gateway_base_url must start with http:// or https://, got '{base_url}'"
            )));
        }
        if self.sandbox.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sandbox.connect_timeout_secs must be positive".to_owned(),
            ));
        }
        if self.sweep.stale_after_secs == 0 || self.sweep.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep.stale_after_secs and sweep.interval_secs must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

const fn default_pool_max_size() -> u32 {
    8
}

const fn default_request_timeout_secs() -> u64 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_stale_after_secs() -> u64 {
    1800
}

const fn default_interval_secs() -> u64 {
    60
}
