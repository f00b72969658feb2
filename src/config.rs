//! Downstream service configuration.
//!
//! The resource service client is constructed exactly once at startup from a
//! [`ServiceConfig`] and passed by reference to everything that needs it.
//! There is no process-wide client factory.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{GatewayError, Result};

/// Configuration for the downstream resource service connection.
///
/// # Examples
///
/// ```
/// use payfront::config::ServiceConfig;
///
/// let config = ServiceConfig::from_toml(
///     r#"
///     base_url = "https://resources.internal/api/"
///     key = "front-door"
///     secret = "s3cret"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.timeout_secs, 30); // default
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the downstream resource service.
    pub base_url: String,

    /// Credential key presented on every downstream call.
    pub key: String,

    /// Credential secret presented on every downstream call.
    pub secret: String,

    /// Maximum idle connections per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl ServiceConfig {
    /// Creates a configuration with default pool and timeout settings.
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            key: key.into(),
            secret: secret.into(),
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the TOML is malformed or
    /// required fields are missing.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| GatewayError::ConfigError(e.to_string()))
    }

    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if:
    /// - `base_url` is not a valid http(s) URL
    /// - `key` is empty
    /// - `timeout_secs` is outside 1-300
    /// - `connect_timeout_secs` is outside 1-60
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| GatewayError::ConfigError(format!("invalid base_url: {e}")))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(GatewayError::ConfigError(
                "base_url must use an http or https scheme".to_owned(),
            ));
        }
        if self.key.is_empty() {
            return Err(GatewayError::ConfigError("key must not be empty".to_owned()));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(GatewayError::ConfigError(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(GatewayError::ConfigError(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_pool_max_idle() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}
