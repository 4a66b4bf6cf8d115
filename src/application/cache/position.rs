//! In-memory position state cache.
//!
//! Fallback tier for the position repository. Every value crossing the cache
//! boundary is an owned clone taken while the lock is held, so callers never
//! share a value with the cache.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{PositionKey, PositionState};

/// Thread-safe map of `(user, symbol) -> PositionState`.
#[derive(Debug, Default)]
pub struct PositionCache {
    entries: RwLock<HashMap<PositionKey, PositionState>>,
}

impl PositionCache {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the state for `key`.
    pub fn put(&self, key: PositionKey, state: &PositionState) {
        self.entries.write().insert(key, state.clone());
    }

    /// Get a copy of the state for `key`.
    #[must_use]
    pub fn get(&self, key: &PositionKey) -> Option<PositionState> {
        self.entries.read().get(key).cloned()
    }

    /// Remove the state for `key`. Returns true if it was present.
    pub fn remove(&self, key: &PositionKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Copies of every state owned by `user_id`, keyed by symbol.
    #[must_use]
    pub fn for_user(&self, user_id: &str) -> HashMap<String, PositionState> {
        self.entries
            .read()
            .iter()
            .filter(|(key, _)| key.belongs_to(user_id))
            .map(|(key, state)| (key.symbol().to_string(), state.clone()))
            .collect()
    }

    /// Copy of every entry, for resynchronization.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(PositionKey, PositionState)> {
        self.entries
            .read()
            .iter()
            .map(|(key, state)| (key.clone(), state.clone()))
            .collect()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;

    fn state(symbol: &str) -> PositionState {
        PositionState::new(symbol, OrderSide::Buy, "scalp")
    }

    #[test]
    fn put_and_get_round_trip() {
        let cache = PositionCache::new();
        let key = PositionKey::new("u1", "BTCUSDT");
        let saved = state("BTCUSDT");
        cache.put(key.clone(), &saved);

        assert_eq!(cache.get(&key), Some(saved));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn returned_copies_are_isolated() {
        let cache = PositionCache::new();
        let key = PositionKey::new("u1", "BTCUSDT");
        let mut original = state("BTCUSDT");
        cache.put(key.clone(), &original);

        original.current_tp_level = 4;
        assert_eq!(cache.get(&key).unwrap().current_tp_level, 0);

        let mut loaded = cache.get(&key).unwrap();
        loaded.current_tp_level = 9;

        assert_eq!(cache.get(&key).unwrap().current_tp_level, 0);
    }

    #[test]
    fn for_user_filters_by_exact_user() {
        let cache = PositionCache::new();
        cache.put(PositionKey::new("u1", "BTCUSDT"), &state("BTCUSDT"));
        cache.put(PositionKey::new("u1", "ETHUSDT"), &state("ETHUSDT"));
        cache.put(PositionKey::new("u10", "SOLUSDT"), &state("SOLUSDT"));
        cache.put(PositionKey::new("u1:x", "XRPUSDT"), &state("XRPUSDT"));

        let mine = cache.for_user("u1");
        assert_eq!(mine.len(), 2);
        assert!(mine.contains_key("BTCUSDT"));
        assert!(mine.contains_key("ETHUSDT"));
    }

    #[test]
    fn remove_and_clear() {
        let cache = PositionCache::new();
        let key = PositionKey::new("u1", "BTCUSDT");
        cache.put(key.clone(), &state("BTCUSDT"));

        assert!(cache.remove(&key));
        assert!(!cache.remove(&key));

        cache.put(key, &state("BTCUSDT"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn snapshot_carries_structured_keys() {
        let cache = PositionCache::new();
        cache.put(PositionKey::new("desk:7", "BTCUSDT"), &state("BTCUSDT"));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0.user_id(), "desk:7");
        assert_eq!(snapshot[0].0.symbol(), "BTCUSDT");
    }
}
