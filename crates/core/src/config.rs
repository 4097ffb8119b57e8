//! Client configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! file, then `AUTHFRONT_*` environment variables (`__` separates nesting,
//! e.g. `AUTHFRONT_API__BASE_URL`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Auth API settings
    pub api: ApiConfig,

    /// Session lifecycle settings
    pub session: SessionConfig,

    /// Directory holding the persisted session
    pub data_dir: PathBuf,
}

/// Auth API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the endpoint paths are appended to
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,
}

/// Session lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds after a session start before it is logged out
    pub idle_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("authfront"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 10 * 60,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl SessionConfig {
    /// Longest accepted idle timeout
    pub const MAX_IDLE_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl ClientConfig {
    /// Environment variable prefix
    pub const ENV_PREFIX: &'static str = "AUTHFRONT";

    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value does not parse
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let defaults = Self::default();

        let mut builder = ::config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default(
                "session.idle_timeout_secs",
                defaults.session.idle_timeout_secs,
            )?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?;

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    ///
    /// `load` runs this; call it again after overriding fields by hand.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigLoadError::Invalid(format!(
                "api.base_url must be an http(s) URL, got {base_url:?}"
            )));
        }
        if self.session.idle_timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid(
                "session.idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.session.idle_timeout_secs > SessionConfig::MAX_IDLE_TIMEOUT_SECS {
            return Err(ConfigLoadError::Invalid(format!(
                "session.idle_timeout_secs must be at most {} (one year), got {}",
                SessionConfig::MAX_IDLE_TIMEOUT_SECS,
                self.session.idle_timeout_secs
            )));
        }
        Ok(())
    }
}
