//! Pending order tracker settings.

use std::time::Duration;

use serde::Deserialize;

use crate::application::order::TrackerSettings;

/// `[tracker]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Timeout for orders that do not carry their own.
    pub default_timeout_secs: u32,
    /// Seconds between timeout scans.
    pub check_interval_secs: u64,
    /// Store TTL added on top of an order's timeout.
    pub ttl_grace_secs: u64,
    /// Upper bound on one cancel call (milliseconds).
    pub cancel_timeout_ms: u64,
}

impl TrackerConfig {
    /// Runtime settings for [`OrderTracker`](crate::application::order::OrderTracker).
    #[must_use]
    pub fn settings(&self) -> TrackerSettings {
        TrackerSettings {
            default_timeout_secs: i64::from(self.default_timeout_secs),
            check_interval: Duration::from_secs(self.check_interval_secs),
            ttl_grace: Duration::from_secs(self.ttl_grace_secs),
            cancel_timeout: Duration::from_millis(self.cancel_timeout_ms),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 180,
            check_interval_secs: 10,
            ttl_grace_secs: 60,
            cancel_timeout_ms: 5000,
        }
    }
}
