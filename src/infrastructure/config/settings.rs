//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates every section.
//! Configuration is loaded from a TOML file; the store URL may be overridden
//! by the `REDIS_URL` environment variable so credentials stay out of files.
//!
//! # Example
//!
//! ```no_run
//! use tradestate::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use url::Url;

use super::logging::LoggingConfig;
use super::positions::PositionsConfig;
use super::store::StoreConfig;
use super::tracker::TrackerConfig;
use crate::application::keys::KeyLayout;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `store.url`.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Main application configuration.
///
/// Every section is optional; an empty file yields a memory-only setup with
/// default timings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Primary store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Pending order tracking.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Position state persistence.
    #[serde(default)]
    pub positions: PositionsConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Applies the `REDIS_URL` override before validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(url) = std::env::var(REDIS_URL_ENV) {
            if !url.trim().is_empty() {
                config.store.url = Some(url.trim().to_string());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed, or
    /// validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Store key layout for this configuration.
    #[must_use]
    pub fn key_layout(&self) -> KeyLayout {
        KeyLayout::new(self.store.key_prefix.clone())
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.store.key_prefix.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "key_prefix" }.into());
        }
        if let Some(url) = &self.store.url {
            validate_redis_url(url)?;
        }

        let non_zero = [
            ("operation_timeout_ms", self.store.operation_timeout_ms),
            ("health_timeout_ms", self.store.health_timeout_ms),
            (
                "default_timeout_secs",
                u64::from(self.tracker.default_timeout_secs),
            ),
            ("check_interval_secs", self.tracker.check_interval_secs),
            ("cancel_timeout_ms", self.tracker.cancel_timeout_ms),
            ("ttl_secs", self.positions.ttl_secs),
            (
                "health_check_interval_secs",
                self.positions.health_check_interval_secs,
            ),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn validate_redis_url(raw: &str) -> std::result::Result<(), ConfigError> {
    let parsed = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field: "url",
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "redis" | "rediss" => Ok(()),
        other => Err(ConfigError::InvalidValue {
            field: "url",
            reason: format!("unsupported scheme `{other}`, expected redis:// or rediss://"),
        }),
    }
}
