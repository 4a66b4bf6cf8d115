//! Background timeout monitor for [`OrderTracker`].
//!
//! The task holds only a weak reference, so dropping the last tracker handle
//! ends it on the next tick.

use std::sync::Arc;

use tracing::info;

use super::tracker::OrderTracker;
use crate::application::monitor::MonitorHandle;

impl OrderTracker {
    /// Start the periodic timeout scan.
    ///
    /// Returns false if a monitor is already running.
    pub fn start_monitor(self: &Arc<Self>) -> bool {
        let mut slot = self.monitor.lock();
        if slot.as_ref().is_some_and(MonitorHandle::is_running) {
            return false;
        }

        let interval = self.settings().check_interval;
        let tracker = Arc::downgrade(self);
        *slot = Some(MonitorHandle::spawn("order_timeout", interval, move || {
            let tracker = tracker.clone();
            async move {
                let Some(tracker) = tracker.upgrade() else {
                    return false;
                };
                tracker.scan_once().await;
                true
            }
        }));

        info!(
            interval_secs = interval.as_secs_f64(),
            timeout_secs = self.timeout_secs(),
            "Order timeout monitor started"
        );
        true
    }

    /// Stop the monitor and wait for an in-flight scan to finish.
    ///
    /// No-op when not running.
    pub async fn stop_monitor(&self) {
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
            info!("Order timeout monitor stopped");
        }
    }

    /// Returns true while the monitor loop is alive.
    #[must_use]
    pub fn is_monitor_running(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(MonitorHandle::is_running)
    }
}
