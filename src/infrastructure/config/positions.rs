//! Position repository settings.

use std::time::Duration;

use serde::Deserialize;

use super::store::StoreConfig;
use crate::application::position::{RepositorySettings, DEFAULT_POSITION_TTL};

/// `[positions]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PositionsConfig {
    /// Lifetime of position records in the store.
    pub ttl_secs: u64,
    /// Seconds between background health probes.
    pub health_check_interval_secs: u64,
    /// Push the cache back to the store after an outage ends.
    pub auto_sync: bool,
}

impl PositionsConfig {
    /// Runtime settings for [`PositionStateRepository`](crate::application::position::PositionStateRepository).
    #[must_use]
    pub fn settings(&self, store: &StoreConfig) -> RepositorySettings {
        RepositorySettings {
            ttl: Duration::from_secs(self.ttl_secs),
            health_timeout: store.health_timeout(),
            health_check_interval: Duration::from_secs(self.health_check_interval_secs),
            auto_sync: self.auto_sync,
        }
    }
}

impl Default for PositionsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_POSITION_TTL.as_secs(),
            health_check_interval_secs: 30,
            auto_sync: true,
        }
    }
}
