//! Periodic background task with cooperative shutdown.
//!
//! Shared by the order timeout monitor and the store recovery monitor. The
//! first tick fires one interval after start.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to a running periodic task.
pub(crate) struct MonitorHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Spawn `tick` every `period` until stopped or until `tick` returns
    /// `false`.
    pub(crate) fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!(monitor = name, "Monitor shutting down");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if !tick().await {
                            debug!(monitor = name, "Monitor owner dropped, exiting");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            name,
            shutdown_tx,
            task,
        }
    }

    /// Returns true while the task loop is alive.
    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal shutdown and wait for the loop to exit.
    ///
    /// A tick in progress completes first.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(monitor = self.name, error = %e, "Monitor task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = MonitorHandle::spawn("test", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(handle.is_running());
        handle.stop().await;

        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 2);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn first_tick_waits_one_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = MonitorHandle::spawn("test", Duration::from_secs(60), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exits_when_tick_declines() {
        let handle = MonitorHandle::spawn("test", Duration::from_millis(5), || async { false });

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!handle.is_running());
        handle.stop().await;
    }
}
