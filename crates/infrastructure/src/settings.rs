//! Gateway settings.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. A TOML file (`tollgate.toml` in the working directory unless a path is given)
//! 3. Environment variables prefixed `TOLLGATE__`, e.g. `TOLLGATE__BASE_URL`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;
use thiserror::Error;
use tollgate_domain::TokenPool;
use url::Url;

use crate::adapters::DEFAULT_USER_AGENT;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tollgate.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TOLLGATE";

/// A configuration file source.
pub type FileSource = File<FileSourceFile, FileFormat>;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value has the wrong type.
    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// No session directory was configured and the platform has no data directory.
    #[error("no session directory configured and no platform data directory available")]
    NoSessionDir,
}

/// Runtime settings for the gateway and its adapters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// Backend base URL; request paths are resolved against it.
    pub base_url: Url,
    /// Per-request transport timeout.
    pub request_timeout_ms: u64,
    /// Upper bound on one refresh call; 0 disables the bound.
    pub refresh_timeout_ms: u64,
    /// Refresh proactively when the token expires within this window; 0 disables.
    pub refresh_buffer_secs: u64,
    /// Directory holding session records.
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
    /// Signed-out entry point of the general pool.
    pub signed_out_redirect: String,
    /// Signed-out entry point of the admin pool.
    pub admin_signed_out_redirect: String,
    /// `User-Agent` sent to the backend.
    pub user_agent: String,
}

impl GatewayConfig {
    /// Loads configuration from `path` (or the default file) and the process environment.
    ///
    /// A missing default file is fine; an explicitly given file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is unreadable or `base_url` is missing or invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Self::from_sources(file, Self::environment(None))
    }

    /// Environment source, optionally over a fixed variable map instead of the process env.
    #[must_use]
    pub fn environment(vars: Option<HashMap<String, String>>) -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(vars)
    }

    /// Builds the configuration from explicit sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is unreadable or a value is invalid.
    pub fn from_sources(file: FileSource, env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("request_timeout_ms", 30_000)?
            .set_default("refresh_timeout_ms", 10_000)?
            .set_default("refresh_buffer_secs", 0)?
            .set_default("signed_out_redirect", "/login")?
            .set_default("admin_signed_out_redirect", "/admin/login")?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .add_source(file)
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Per-request transport timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Upper bound on one refresh call, if any.
    #[must_use]
    pub const fn refresh_timeout(&self) -> Option<Duration> {
        if self.refresh_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.refresh_timeout_ms))
        }
    }

    /// Proactive refresh window.
    #[must_use]
    pub fn refresh_buffer(&self) -> chrono::Duration {
        i64::try_from(self.refresh_buffer_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(chrono::Duration::zero)
    }

    /// Directory holding session records: the configured one, or
    /// `<platform data dir>/tollgate`.
    ///
    /// # Errors
    ///
    /// Returns `NoSessionDir` if neither is available.
    pub fn session_dir(&self) -> Result<PathBuf, ConfigError> {
        self.session_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("tollgate")))
            .ok_or(ConfigError::NoSessionDir)
    }

    /// Signed-out entry point for `pool`.
    #[must_use]
    pub fn signed_out_path(&self, pool: TokenPool) -> &str {
        match pool {
            TokenPool::General => &self.signed_out_redirect,
            TokenPool::Admin => &self.admin_signed_out_redirect,
        }
    }
}
