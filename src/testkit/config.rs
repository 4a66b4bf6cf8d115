//! Canonical test settings.
//!
//! Short intervals so background monitors tick within a test's lifetime.

use std::time::Duration;

use crate::application::order::TrackerSettings;
use crate::application::position::RepositorySettings;

/// Tracker settings with a 20ms scan interval.
pub fn fast_tracker() -> TrackerSettings {
    TrackerSettings {
        check_interval: Duration::from_millis(20),
        cancel_timeout: Duration::from_millis(200),
        ..TrackerSettings::default()
    }
}

/// Repository settings with a 20ms health-check interval.
pub fn fast_repository() -> RepositorySettings {
    RepositorySettings {
        health_check_interval: Duration::from_millis(20),
        health_timeout: Duration::from_millis(200),
        ..RepositorySettings::default()
    }
}
