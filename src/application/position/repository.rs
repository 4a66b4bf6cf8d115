//! Position state repository with a primary store and an in-memory fallback.
//!
//! Writes always land in the cache first. While the store is healthy they are
//! also written through in one atomic batch; any store failure flips the
//! repository to degraded and the cache becomes authoritative until a health
//! probe succeeds again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::availability::{StoreHealth, StoreState};
use crate::application::cache::position::PositionCache;
use crate::application::keys::KeyLayout;
use crate::domain::{PositionKey, PositionState};
use crate::error::{Error, Result, StoreError};
use crate::port::outbound::store::{KeyValueStore, StoreCommand};

/// Default lifetime of a position record and its index (7 days).
pub const DEFAULT_POSITION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tunables for [`PositionStateRepository`].
#[derive(Debug, Clone)]
pub struct RepositorySettings {
    /// TTL of position records and of each user's index set.
    pub ttl: Duration,
    /// Upper bound on a health probe.
    pub health_timeout: Duration,
    /// Interval of the [`RecoveryMonitor`](super::RecoveryMonitor) probe.
    pub health_check_interval: Duration,
    /// Push the cache to the store when the recovery monitor sees it return.
    pub auto_sync: bool,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_POSITION_TTL,
            health_timeout: Duration::from_secs(2),
            health_check_interval: Duration::from_secs(30),
            auto_sync: true,
        }
    }
}

/// Snapshot for operational dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStats {
    pub store_available: bool,
    pub store_state: StoreState,
    pub in_memory_cache_size: usize,
    pub backend: &'static str,
}

/// Durable position state storage that keeps working through store outages.
pub struct PositionStateRepository {
    store: Option<Arc<dyn KeyValueStore>>,
    keys: KeyLayout,
    settings: RepositorySettings,
    health: StoreHealth,
    cache: PositionCache,
}

impl PositionStateRepository {
    /// Create a repository backed by `store`.
    ///
    /// Probes the store once; an unreachable store starts the repository in
    /// degraded mode rather than failing construction.
    pub async fn new(
        store: Arc<dyn KeyValueStore>,
        keys: KeyLayout,
        settings: RepositorySettings,
    ) -> Self {
        let repository = Self {
            store: Some(store),
            keys,
            settings,
            health: StoreHealth::new(StoreState::Degraded),
            cache: PositionCache::new(),
        };

        match repository.probe().await {
            Ok(()) => {
                repository.health.mark_healthy();
                info!(
                    backend = repository.backend_name(),
                    "Position repository using primary store"
                );
            }
            Err(e) => warn!(
                error = %e,
                "Store unavailable at startup, using in-memory cache"
            ),
        }
        repository
    }

    /// Create a repository with no store. It stays degraded for its lifetime.
    #[must_use]
    pub fn memory_only() -> Self {
        info!("Position repository running without a primary store");
        Self {
            store: None,
            keys: KeyLayout::default(),
            settings: RepositorySettings::default(),
            health: StoreHealth::new(StoreState::Degraded),
            cache: PositionCache::new(),
        }
    }

    /// The configured store, if any.
    #[must_use]
    pub fn store(&self) -> Option<&Arc<dyn KeyValueStore>> {
        self.store.as_ref()
    }

    #[must_use]
    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    /// Persist `state` for `(user_id, symbol)`.
    ///
    /// Returns the stored copy with `saved_at` stamped. A store outage alone
    /// never produces an error: the cache already holds the value.
    pub async fn save_position_state(
        &self,
        user_id: &str,
        symbol: &str,
        state: &PositionState,
    ) -> Result<PositionState> {
        let key = position_key(user_id, symbol)?;

        let mut stamped = state.clone();
        stamped.saved_at = Utc::now();
        self.cache.put(key.clone(), &stamped);

        let Some(store) = self.healthy_store() else {
            debug!(user_id, symbol, "Store degraded, position saved to cache only");
            return Ok(stamped);
        };

        let data = serde_json::to_string(&stamped)?;
        match store.exec_atomic(&self.write_batch(&key, data)).await {
            Ok(()) => debug!(
                user_id,
                symbol,
                tp_level = stamped.current_tp_level,
                "Saved position state"
            ),
            Err(e) => self.degrade(&e, "save"),
        }
        Ok(stamped)
    }

    /// Load the state for `(user_id, symbol)`.
    ///
    /// Reads the store while healthy and refreshes the cache from it. A store
    /// miss, error or undecodable payload falls back to the cache. `None`
    /// means the position exists nowhere. A successful read confirms the
    /// store healthy unless another call degraded it in the meantime.
    pub async fn load_position_state(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Option<PositionState>> {
        let key = position_key(user_id, symbol)?;

        let epoch = self.health.epoch();
        if let Some(store) = self.healthy_store() {
            let record = self.keys.position(user_id, symbol);
            match store.get(&record).await {
                Ok(Some(data)) => {
                    self.recover(epoch, "load");
                    match serde_json::from_str::<PositionState>(&data) {
                        Ok(state) => {
                            self.cache.put(key, &state);
                            return Ok(Some(state));
                        }
                        Err(e) => warn!(
                            user_id,
                            symbol,
                            error = %e,
                            "Malformed position record, using in-memory cache"
                        ),
                    }
                }
                Ok(None) => self.recover(epoch, "load"),
                Err(e) => self.degrade(&e, "load"),
            }
        }

        Ok(self.cache.get(&key))
    }

    /// Load every position of `user_id`, keyed by symbol.
    ///
    /// While healthy the user's index drives the listing and each symbol is
    /// loaded on its own, so an outage mid-listing degrades per symbol.
    pub async fn load_all_positions(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, PositionState>> {
        if user_id.is_empty() {
            return Err(Error::InvalidKey { field: "user_id" });
        }

        if let Some(store) = self.healthy_store() {
            match store.set_members(&self.keys.position_index(user_id)).await {
                Ok(symbols) => {
                    let mut positions = HashMap::with_capacity(symbols.len());
                    for symbol in symbols {
                        if let Some(state) = self.load_position_state(user_id, &symbol).await? {
                            positions.insert(symbol, state);
                        }
                    }
                    return Ok(positions);
                }
                Err(e) => self.degrade(&e, "load_all"),
            }
        }

        Ok(self.cache.for_user(user_id))
    }

    /// Remove the state for `(user_id, symbol)`.
    ///
    /// The cache entry is always removed. Store failures are logged.
    pub async fn delete_position(&self, user_id: &str, symbol: &str) -> Result<()> {
        let key = position_key(user_id, symbol)?;
        self.cache.remove(&key);

        if let Some(store) = self.healthy_store() {
            let batch = [
                StoreCommand::delete(self.keys.position(user_id, symbol)),
                StoreCommand::set_remove(self.keys.position_index(user_id), symbol),
            ];
            match store.exec_atomic(&batch).await {
                Ok(()) => debug!(user_id, symbol, "Deleted position state"),
                Err(e) => self.degrade(&e, "delete"),
            }
        }
        Ok(())
    }

    /// Probe the store and update availability. Returns the new state.
    pub async fn check_store_connection(&self) -> bool {
        match self.probe().await {
            Ok(()) => {
                if self.health.mark_healthy() {
                    info!(
                        cached = self.cache.len(),
                        "Store connection recovered"
                    );
                }
                true
            }
            Err(e) => {
                if self.health.mark_degraded() {
                    warn!(error = %e, "Store health check failed, using in-memory cache");
                } else {
                    debug!(error = %e, "Store still unavailable");
                }
                false
            }
        }
    }

    /// Rewrite every cached position to the store.
    ///
    /// Requires a healthy store. Stops at the first store failure, which flips
    /// the repository back to degraded. Returns how many entries were written.
    pub async fn sync_cache_to_store(&self) -> Result<usize> {
        let Some(store) = self.healthy_store() else {
            return Err(self.unavailable().into());
        };

        let mut written = 0;
        for (key, state) in self.cache.snapshot() {
            let data = match serde_json::to_string(&state) {
                Ok(data) => data,
                Err(e) => {
                    warn!(position = %key, error = %e, "Skipping unserializable position");
                    continue;
                }
            };

            if let Err(e) = store.exec_atomic(&self.write_batch(&key, data)).await {
                self.degrade(&e, "sync");
                return Err(e.into());
            }
            written += 1;
        }

        info!(written, "Synced in-memory positions to store");
        Ok(written)
    }

    /// Remove index members of `user_id` whose record exists neither in the
    /// store nor in the cache. Returns how many were removed.
    pub async fn prune_index(&self, user_id: &str) -> Result<usize> {
        if user_id.is_empty() {
            return Err(Error::InvalidKey { field: "user_id" });
        }
        let Some(store) = self.healthy_store() else {
            return Err(self.unavailable().into());
        };

        let index = self.keys.position_index(user_id);
        let symbols = store.set_members(&index).await.inspect_err(|e| {
            self.degrade(e, "prune");
        })?;

        let mut stale = Vec::new();
        for symbol in symbols {
            let record = self.keys.position(user_id, &symbol);
            let in_store = store
                .get(&record)
                .await
                .inspect_err(|e| self.degrade(e, "prune"))?
                .is_some();
            let in_cache = self
                .cache
                .get(&PositionKey::new(user_id, symbol.as_str()))
                .is_some();
            if !in_store && !in_cache {
                stale.push(StoreCommand::set_remove(index.clone(), symbol));
            }
        }

        if !stale.is_empty() {
            store
                .exec_atomic(&stale)
                .await
                .inspect_err(|e| self.degrade(e, "prune"))?;
            debug!(user_id, pruned = stale.len(), "Pruned position index");
        }
        Ok(stale.len())
    }

    /// True while the store is considered reachable.
    #[must_use]
    pub fn is_store_available(&self) -> bool {
        self.store.is_some() && self.health.is_healthy()
    }

    /// Drop every cached position.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            store_available: self.is_store_available(),
            store_state: self.health.state(),
            in_memory_cache_size: self.cache.len(),
            backend: self.backend_name(),
        }
    }

    fn backend_name(&self) -> &'static str {
        self.store.as_ref().map_or("none", |s| s.backend_name())
    }

    fn healthy_store(&self) -> Option<&Arc<dyn KeyValueStore>> {
        self.store.as_ref().filter(|_| self.health.is_healthy())
    }

    fn unavailable(&self) -> StoreError {
        if self.store.is_some() {
            StoreError::Unavailable("store marked unavailable".into())
        } else {
            StoreError::NotConfigured
        }
    }

    async fn probe(&self) -> std::result::Result<(), StoreError> {
        let Some(store) = &self.store else {
            return Err(StoreError::NotConfigured);
        };
        match tokio::time::timeout(self.settings.health_timeout, store.ping()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation: "ping",
                after_ms: u64::try_from(self.settings.health_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            }),
        }
    }

    fn write_batch(&self, key: &PositionKey, data: String) -> [StoreCommand; 3] {
        let index = self.keys.position_index(key.user_id());
        [
            StoreCommand::set(
                self.keys.position(key.user_id(), key.symbol()),
                data,
                self.settings.ttl,
            ),
            StoreCommand::set_add(index.clone(), key.symbol()),
            StoreCommand::expire(index, self.settings.ttl),
        ]
    }

    fn degrade(&self, error: &StoreError, operation: &'static str) {
        if self.health.mark_degraded() {
            warn!(operation, error = %error, "Store unavailable, using in-memory cache");
        } else {
            debug!(operation, error = %error, "Store call failed while degraded");
        }
    }

    /// A store call that began at `epoch` succeeded.
    fn recover(&self, epoch: u64, operation: &'static str) {
        if self.health.mark_healthy_since(epoch) {
            info!(operation, "Store reachable again");
        }
    }
}

fn position_key(user_id: &str, symbol: &str) -> Result<PositionKey> {
    if user_id.is_empty() {
        return Err(Error::InvalidKey { field: "user_id" });
    }
    if symbol.is_empty() {
        return Err(Error::InvalidKey { field: "symbol" });
    }
    Ok(PositionKey::new(user_id, symbol))
}
