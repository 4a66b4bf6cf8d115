//! Pending order tracker.
//!
//! Records every open order in the primary store with a deadline. A background
//! monitor (see [`super::monitor`]) scans the records and asks the registered
//! [`OrderCanceller`] to cancel anything overdue.
//!
//! Cancellation is attempted at most once per timeout: the order leaves
//! tracking whether or not the cancel call succeeded, and the exchange's own
//! order state settles anything left behind.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::monitor::MonitorHandle;
use crate::application::keys::KeyLayout;
use crate::domain::{NewPendingOrder, OrderId, PendingOrder, DEFAULT_ORDER_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::port::outbound::canceller::OrderCanceller;
use crate::port::outbound::store::{KeyValueStore, StoreCommand};

/// Tunables for [`OrderTracker`].
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Timeout applied to orders that do not carry their own.
    pub default_timeout_secs: i64,
    /// Time between monitor scans.
    pub check_interval: Duration,
    /// Extra store TTL beyond the order timeout; expiry is only a safety net.
    pub ttl_grace: Duration,
    /// Upper bound on a single cancel call.
    pub cancel_timeout: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_ORDER_TIMEOUT_SECS,
            check_interval: Duration::from_secs(10),
            ttl_grace: Duration::from_secs(60),
            cancel_timeout: Duration::from_secs(5),
        }
    }
}

/// Snapshot for operational dashboards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerStats {
    pub pending_count: usize,
    pub by_symbol: BTreeMap<String, usize>,
    pub timeout_secs: i64,
    pub monitor_running: bool,
    pub check_interval_secs: u64,
    /// Set when the pending orders could not be listed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of reading the order index once.
struct Listing {
    orders: Vec<PendingOrder>,
    pruned: usize,
}

/// Tracks unfilled orders and enforces their time limits.
pub struct OrderTracker {
    store: Arc<dyn KeyValueStore>,
    keys: KeyLayout,
    settings: TrackerSettings,
    default_timeout_secs: AtomicI64,
    canceller: RwLock<Option<Arc<dyn OrderCanceller>>>,
    pub(super) monitor: Mutex<Option<MonitorHandle>>,
}

impl OrderTracker {
    /// Create a tracker writing to `store` under `keys`.
    pub fn new(store: Arc<dyn KeyValueStore>, keys: KeyLayout, settings: TrackerSettings) -> Self {
        let default_timeout = if settings.default_timeout_secs > 0 {
            settings.default_timeout_secs
        } else {
            DEFAULT_ORDER_TIMEOUT_SECS
        };

        Self {
            store,
            keys,
            default_timeout_secs: AtomicI64::new(default_timeout),
            settings,
            canceller: RwLock::new(None),
            monitor: Mutex::new(None),
        }
    }

    /// Register the callback used to cancel timed-out orders.
    ///
    /// May be replaced at any time; the next scan uses the new one.
    pub fn set_canceller(&self, canceller: Arc<dyn OrderCanceller>) {
        *self.canceller.write() = Some(canceller);
    }

    /// Update the default timeout. Non-positive values are ignored.
    pub fn set_timeout_secs(&self, timeout_secs: i64) {
        if timeout_secs > 0 {
            self.default_timeout_secs
                .store(timeout_secs, Ordering::SeqCst);
        }
    }

    /// Current default timeout.
    #[must_use]
    pub fn timeout_secs(&self) -> i64 {
        self.default_timeout_secs.load(Ordering::SeqCst)
    }

    /// Tracker settings.
    #[must_use]
    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Start tracking an order.
    ///
    /// Writes the record (TTL = timeout + grace) and its index entry in one
    /// batch. A store failure is returned as [`Error::Store`]: tracking is then
    /// not guaranteed, and the caller decides whether to retry.
    pub async fn track(&self, request: NewPendingOrder) -> Result<PendingOrder> {
        if request.symbol.is_empty() {
            return Err(Error::InvalidKey { field: "symbol" });
        }

        let order = PendingOrder::from_request(request, self.timeout_secs(), Utc::now())?;
        let key = self.keys.pending_order(order.symbol(), order.order_id());
        let data = serde_json::to_string(&order)?;
        let ttl = Duration::from_secs(order.timeout_secs().unsigned_abs()) + self.settings.ttl_grace;

        let batch = [
            StoreCommand::set(key.clone(), data, ttl),
            StoreCommand::set_add(self.keys.pending_order_index(), key),
        ];
        if let Err(e) = self.store.exec_atomic(&batch).await {
            warn!(
                symbol = order.symbol(),
                order_id = order.order_id(),
                error = %e,
                "Store unavailable, order not tracked"
            );
            return Err(e.into());
        }

        info!(
            symbol = order.symbol(),
            order_id = order.order_id(),
            timeout_secs = order.timeout_secs(),
            timeout_at = %order.timeout_at().format("%H:%M:%S"),
            source = order.source(),
            "Tracking order"
        );
        Ok(order)
    }

    /// Stop tracking an order after fill or cancel.
    ///
    /// Idempotent. Store failures are logged; the record then expires on its
    /// own TTL.
    pub async fn remove(&self, symbol: &str, order_id: OrderId) {
        let key = self.keys.pending_order(symbol, order_id);
        let batch = [
            StoreCommand::delete(key.clone()),
            StoreCommand::set_remove(self.keys.pending_order_index(), key),
        ];

        match self.store.exec_atomic(&batch).await {
            Ok(()) => debug!(symbol, order_id, "Removed order from tracking"),
            Err(e) => warn!(symbol, order_id, error = %e, "Failed to remove order from tracking"),
        }
    }

    /// Look up a single tracked order.
    ///
    /// `None` when the order was filled, cancelled, expired, or its record is
    /// unreadable.
    pub async fn get(&self, symbol: &str, order_id: OrderId) -> Result<Option<PendingOrder>> {
        let key = self.keys.pending_order(symbol, order_id);
        let Some(data) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&data) {
            Ok(order) => Ok(Some(order)),
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed pending order record");
                Ok(None)
            }
        }
    }

    /// All tracked orders, oldest first.
    ///
    /// Index entries whose record has expired or cannot be decoded are pruned
    /// along the way.
    pub async fn get_all(&self) -> Result<Vec<PendingOrder>> {
        Ok(self.list().await?.orders)
    }

    /// Prune dead index entries. Returns how many were removed.
    pub async fn sweep_index(&self) -> Result<usize> {
        Ok(self.list().await?.pruned)
    }

    async fn list(&self) -> Result<Listing> {
        let index = self.keys.pending_order_index();
        let members = self.store.set_members(&index).await?;

        let mut orders = Vec::with_capacity(members.len());
        let mut prune = Vec::new();
        for key in members {
            match self.store.get(&key).await {
                Ok(Some(data)) => match serde_json::from_str::<PendingOrder>(&data) {
                    Ok(order) => orders.push(order),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Malformed pending order record, pruning");
                        prune.push(StoreCommand::delete(key.clone()));
                        prune.push(StoreCommand::set_remove(index.clone(), key));
                    }
                },
                Ok(None) => prune.push(StoreCommand::set_remove(index.clone(), key)),
                Err(e) => warn!(key = %key, error = %e, "Failed to read pending order"),
            }
        }

        let mut pruned = 0;
        if !prune.is_empty() {
            let stale = prune
                .iter()
                .filter(|c| matches!(c, StoreCommand::SetRemove { .. }))
                .count();
            match self.store.exec_atomic(&prune).await {
                Ok(()) => {
                    debug!(pruned = stale, "Pruned stale order index entries");
                    pruned = stale;
                }
                Err(e) => debug!(error = %e, "Failed to prune order index"),
            }
        }

        orders.sort_by_key(PendingOrder::placed_at);
        Ok(Listing { orders, pruned })
    }

    /// Run one timeout scan.
    ///
    /// Every overdue order gets one cancel attempt and is then removed from
    /// tracking, whatever the outcome. Returns the orders that timed out.
    pub async fn scan_once(&self) -> Vec<PendingOrder> {
        let orders = match self.get_all().await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "Failed to list pending orders");
                return Vec::new();
            }
        };

        let now = Utc::now();
        let canceller = self.canceller.read().clone();
        let mut timed_out = Vec::new();

        for order in orders.into_iter().filter(|o| o.is_timed_out(now)) {
            let symbol = order.symbol();
            let order_id = order.order_id();
            info!(
                symbol,
                order_id,
                age_secs = order.age(now).num_seconds(),
                placed_at = %order.placed_at().format("%H:%M:%S"),
                timeout_at = %order.timeout_at().format("%H:%M:%S"),
                "Order timed out"
            );

            match &canceller {
                Some(canceller) => match self.cancel(canceller.as_ref(), symbol, order_id).await {
                    Ok(()) => info!(symbol, order_id, "Cancelled timed-out order"),
                    Err(e) => warn!(
                        symbol,
                        order_id,
                        error = %e,
                        "Failed to cancel timed-out order, dropping it from tracking"
                    ),
                },
                None => warn!(symbol, order_id, "No canceller registered, cannot cancel order"),
            }

            self.remove(symbol, order_id).await;
            timed_out.push(order);
        }

        timed_out
    }

    async fn cancel(
        &self,
        canceller: &dyn OrderCanceller,
        symbol: &str,
        order_id: OrderId,
    ) -> Result<()> {
        match tokio::time::timeout(
            self.settings.cancel_timeout,
            canceller.cancel(symbol, order_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Cancel {
                symbol: symbol.to_string(),
                order_id,
                reason: format!(
                    "no response within {}ms",
                    self.settings.cancel_timeout.as_millis()
                ),
            }),
        }
    }

    /// Snapshot of pending orders and monitor state.
    pub async fn stats(&self) -> TrackerStats {
        let mut stats = TrackerStats {
            timeout_secs: self.timeout_secs(),
            monitor_running: self.is_monitor_running(),
            check_interval_secs: self.settings.check_interval.as_secs(),
            ..TrackerStats::default()
        };

        match self.get_all().await {
            Ok(orders) => {
                stats.pending_count = orders.len();
                for order in &orders {
                    *stats.by_symbol.entry(order.symbol().to_string()).or_default() += 1;
                }
            }
            Err(e) => stats.error = Some(e.to_string()),
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::testkit;
    use crate::testkit::canceller::RecordingCanceller;
    use chrono::Duration as ChronoDuration;

    fn tracker() -> (Arc<MemoryStore>, OrderTracker) {
        let store = Arc::new(MemoryStore::new());
        let tracker = OrderTracker::new(
            store.clone(),
            KeyLayout::default(),
            TrackerSettings::default(),
        );
        (store, tracker)
    }

    #[tokio::test]
    async fn track_derives_deadline_and_ttl() {
        let (store, tracker) = tracker();
        let order = tracker
            .track(testkit::domain::order_request("BTCUSDT", 42).with_timeout_secs(30))
            .await
            .unwrap();

        assert_eq!(
            order.timeout_at(),
            order.placed_at() + ChronoDuration::seconds(30)
        );

        let key = KeyLayout::default().pending_order("BTCUSDT", 42);
        let ttl = store.ttl(&key).unwrap();
        assert!(ttl > Duration::from_secs(85) && ttl <= Duration::from_secs(90));
    }

    #[tokio::test]
    async fn track_uses_runtime_default_timeout() {
        let (_store, tracker) = tracker();
        tracker.set_timeout_secs(45);
        tracker.set_timeout_secs(0);

        let order = tracker
            .track(testkit::domain::order_request("ETHUSDT", 1))
            .await
            .unwrap();
        assert_eq!(order.timeout_secs(), 45);
    }

    #[tokio::test]
    async fn track_fails_when_store_down() {
        let (store, tracker) = tracker();
        store.set_available(false);

        let err = tracker
            .track(testkit::domain::order_request("BTCUSDT", 1))
            .await
            .unwrap_err();
        assert!(err.is_store_unavailable());
    }

    #[tokio::test]
    async fn track_rejects_empty_symbol() {
        let (_store, tracker) = tracker();
        let err = tracker
            .track(testkit::domain::order_request("", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKey { field: "symbol" }));
    }

    #[tokio::test]
    async fn track_rejects_out_of_range_timeout() {
        let (store, tracker) = tracker();
        for timeout_secs in [i64::MAX, 10_000_000_000_000] {
            let err = tracker
                .track(testkit::domain::order_request("BTCUSDT", 1).with_timeout_secs(timeout_secs))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidValue {
                    field: "timeout_secs",
                    ..
                }
            ));
        }
        assert!(store.is_empty());

        tracker.set_timeout_secs(i64::MAX);
        assert!(tracker
            .track(testkit::domain::order_request("BTCUSDT", 2))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_store, tracker) = tracker();
        tracker
            .track(testkit::domain::order_request("BTCUSDT", 7))
            .await
            .unwrap();

        tracker.remove("BTCUSDT", 7).await;
        tracker.remove("BTCUSDT", 7).await;

        assert!(tracker.get_all().await.unwrap().is_empty());
        assert!(tracker.get("BTCUSDT", 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_all_prunes_expired_records() {
        let (store, tracker) = tracker();
        for id in 1..=3 {
            tracker
                .track(testkit::domain::order_request("BTCUSDT", id))
                .await
                .unwrap();
        }
        store.evict(&KeyLayout::default().pending_order("BTCUSDT", 2));

        let orders = tracker.get_all().await.unwrap();
        assert_eq!(orders.len(), 2);

        let members = store
            .set_members(&KeyLayout::default().pending_order_index())
            .await
            .unwrap();
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn sweep_prunes_malformed_records() {
        let (store, tracker) = tracker();
        let keys = KeyLayout::default();
        let bad = keys.pending_order("BTCUSDT", 99);
        store.insert_raw(bad.clone(), "{not json");
        store
            .exec_atomic(&[StoreCommand::set_add(keys.pending_order_index(), bad.clone())])
            .await
            .unwrap();

        assert_eq!(tracker.sweep_index().await.unwrap(), 1);
        assert!(!store.contains_key(&bad));
        assert_eq!(tracker.sweep_index().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn scan_cancels_only_overdue_orders() {
        let (_store, tracker) = tracker();
        let canceller = Arc::new(RecordingCanceller::new());
        tracker.set_canceller(canceller.clone());

        let past = Utc::now() - ChronoDuration::seconds(6);
        tracker
            .track(
                testkit::domain::order_request("BTCUSDT", 42)
                    .with_timeout_secs(5)
                    .placed_at(past),
            )
            .await
            .unwrap();
        tracker
            .track(testkit::domain::order_request("ETHUSDT", 43).with_timeout_secs(60))
            .await
            .unwrap();

        let timed_out = tracker.scan_once().await;

        assert_eq!(timed_out.len(), 1);
        assert_eq!(canceller.calls(), vec![("BTCUSDT".to_string(), 42)]);
        let remaining = tracker.get_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].order_id(), 43);
    }

    #[tokio::test]
    async fn failed_cancel_still_stops_tracking() {
        let (_store, tracker) = tracker();
        let canceller = Arc::new(RecordingCanceller::failing());
        tracker.set_canceller(canceller.clone());

        let past = Utc::now() - ChronoDuration::seconds(10);
        tracker
            .track(
                testkit::domain::order_request("BTCUSDT", 1)
                    .with_timeout_secs(1)
                    .placed_at(past),
            )
            .await
            .unwrap();

        tracker.scan_once().await;
        tracker.scan_once().await;

        assert_eq!(canceller.calls().len(), 1);
        assert!(tracker.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_without_canceller_still_removes() {
        let (_store, tracker) = tracker();
        let past = Utc::now() - ChronoDuration::seconds(10);
        tracker
            .track(
                testkit::domain::order_request("BTCUSDT", 1)
                    .with_timeout_secs(1)
                    .placed_at(past),
            )
            .await
            .unwrap();

        assert_eq!(tracker.scan_once().await.len(), 1);
        assert!(tracker.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_group_by_symbol() {
        let (_store, tracker) = tracker();
        for (symbol, id) in [("BTCUSDT", 1), ("BTCUSDT", 2), ("ETHUSDT", 3)] {
            tracker
                .track(testkit::domain::order_request(symbol, id))
                .await
                .unwrap();
        }

        let stats = tracker.stats().await;
        assert_eq!(stats.pending_count, 3);
        assert_eq!(stats.by_symbol.get("BTCUSDT"), Some(&2));
        assert_eq!(stats.by_symbol.get("ETHUSDT"), Some(&1));
        assert_eq!(stats.timeout_secs, DEFAULT_ORDER_TIMEOUT_SECS);
        assert!(!stats.monitor_running);
        assert!(stats.error.is_none());
    }

    #[tokio::test]
    async fn stats_report_listing_error() {
        let (store, tracker) = tracker();
        store.set_available(false);

        let stats = tracker.stats().await;
        assert_eq!(stats.pending_count, 0);
        assert!(stats.error.is_some());
    }
}
