//! Primary store connection settings.

use std::time::Duration;

use serde::Deserialize;

use crate::application::keys::DEFAULT_KEY_PREFIX;

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis URL. Absent means memory-only operation.
    ///
    /// Overridden by the `REDIS_URL` environment variable.
    pub url: Option<String>,
    /// Prefix shared by every key this process writes.
    pub key_prefix: String,
    /// Upper bound on a single store call (milliseconds).
    pub operation_timeout_ms: u64,
    /// Upper bound on a health probe (milliseconds).
    pub health_timeout_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    #[must_use]
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            operation_timeout_ms: 1000,
            health_timeout_ms: 2000,
        }
    }
}
