//! Background store recovery for [`PositionStateRepository`].
//!
//! Probes the store on an interval. When a probe flips the repository from
//! degraded to healthy, the in-memory cache is pushed back to the store so
//! writes made during the outage are not lost.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::repository::PositionStateRepository;
use crate::application::monitor::MonitorHandle;

/// Periodic health probe with resync on recovery.
pub struct RecoveryMonitor {
    repository: Arc<PositionStateRepository>,
    handle: Mutex<Option<MonitorHandle>>,
}

impl RecoveryMonitor {
    pub fn new(repository: Arc<PositionStateRepository>) -> Self {
        Self {
            repository,
            handle: Mutex::new(None),
        }
    }

    /// Start probing. Returns false if already running.
    pub fn start(&self) -> bool {
        let mut slot = self.handle.lock();
        if slot.as_ref().is_some_and(MonitorHandle::is_running) {
            return false;
        }

        let interval = self.repository.settings().health_check_interval;
        let auto_sync = self.repository.settings().auto_sync;
        let repository = self.repository.clone();
        *slot = Some(MonitorHandle::spawn("store_recovery", interval, move || {
            let repository = repository.clone();
            async move {
                probe_and_resync(&repository, auto_sync).await;
                true
            }
        }));

        info!(
            interval_secs = interval.as_secs_f64(),
            auto_sync,
            "Store recovery monitor started"
        );
        true
    }

    /// Stop probing and wait for an in-flight probe or sync to finish.
    pub async fn stop(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
            info!("Store recovery monitor stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(MonitorHandle::is_running)
    }
}

async fn probe_and_resync(repository: &PositionStateRepository, auto_sync: bool) {
    let was_available = repository.is_store_available();
    if !repository.check_store_connection().await || was_available || !auto_sync {
        return;
    }

    match repository.sync_cache_to_store().await {
        Ok(written) => info!(written, "Resynced positions after store recovery"),
        Err(e) => warn!(error = %e, "Resync after store recovery failed"),
    }
}
