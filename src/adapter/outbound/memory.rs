//! In-process key-value store.
//!
//! Backs memory-only deployments and tests. Honors TTLs lazily on read and
//! eagerly through [`MemoryStore::sweep_expired`], and can be switched
//! unavailable to simulate a primary-store outage.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::port::outbound::store::{KeyValueStore, StoreCommand};

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    entry: Entry,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store with TTL and set support.
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Slot>>,
    available: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    ///
    /// Data is retained across outages, as with a restarted Redis that kept
    /// its dataset.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Drop every expired key. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|_, slot| !slot.is_expired(now));
        before - data.len()
    }

    /// Remaining TTL of a live key, `None` if missing or persistent.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let data = self.data.read();
        let slot = data.get(key).filter(|s| !s.is_expired(now))?;
        slot.expires_at.map(|at| at.saturating_duration_since(now))
    }

    /// Returns true if a live key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.data
            .read()
            .get(key)
            .is_some_and(|slot| !slot.is_expired(now))
    }

    /// Remove a key outright, bypassing availability. Useful to emulate
    /// eviction or expiry in tests.
    pub fn evict(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Write a raw value, bypassing availability.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(
            key.into(),
            Slot {
                entry: Entry::Value(value.into()),
                expires_at: None,
            },
        );
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .values()
            .filter(|slot| !slot.is_expired(now))
            .count()
    }

    /// Returns true if no live keys exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store switched off".into()))
        }
    }

    /// Reject a batch that would hit a set command against a plain value,
    /// tracking the key types earlier commands in the batch leave behind.
    fn validate(
        data: &HashMap<String, Slot>,
        commands: &[StoreCommand],
        now: Instant,
    ) -> Result<(), StoreError> {
        let mut holds_value: HashMap<&str, bool> = HashMap::new();
        for command in commands {
            match command {
                StoreCommand::Set { key, .. } => {
                    holds_value.insert(key, true);
                }
                StoreCommand::Delete { key } => {
                    holds_value.insert(key, false);
                }
                StoreCommand::SetAdd { key, .. } | StoreCommand::SetRemove { key, .. } => {
                    let is_value = holds_value.get(key.as_str()).copied().unwrap_or_else(|| {
                        data.get(key).is_some_and(|slot| {
                            !slot.is_expired(now) && matches!(slot.entry, Entry::Value(_))
                        })
                    });
                    if is_value {
                        return Err(wrong_type(key));
                    }
                    holds_value.insert(key, false);
                }
                StoreCommand::Expire { .. } => {}
            }
        }
        Ok(())
    }

    fn apply(
        data: &mut HashMap<String, Slot>,
        command: &StoreCommand,
        now: Instant,
    ) -> Result<(), StoreError> {
        // Expired keys behave as missing.
        if let Some(key) = command_key(command) {
            if data.get(key).is_some_and(|slot| slot.is_expired(now)) {
                data.remove(key);
            }
        }

        match command {
            StoreCommand::Set { key, value, ttl } => {
                data.insert(
                    key.clone(),
                    Slot {
                        entry: Entry::Value(value.clone()),
                        expires_at: now.checked_add(*ttl),
                    },
                );
            }
            StoreCommand::Delete { key } => {
                data.remove(key);
            }
            StoreCommand::SetAdd { key, member } => {
                let slot = data.entry(key.clone()).or_insert_with(|| Slot {
                    entry: Entry::Set(HashSet::new()),
                    expires_at: None,
                });
                match &mut slot.entry {
                    Entry::Set(members) => {
                        members.insert(member.clone());
                    }
                    Entry::Value(_) => return Err(wrong_type(key)),
                }
            }
            StoreCommand::SetRemove { key, member } => {
                let mut now_empty = false;
                if let Some(slot) = data.get_mut(key) {
                    match &mut slot.entry {
                        Entry::Set(members) => {
                            members.remove(member);
                            now_empty = members.is_empty();
                        }
                        Entry::Value(_) => return Err(wrong_type(key)),
                    }
                }
                if now_empty {
                    data.remove(key);
                }
            }
            StoreCommand::Expire { key, ttl } => {
                if let Some(slot) = data.get_mut(key) {
                    slot.expires_at = now.checked_add(*ttl);
                }
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn command_key(command: &StoreCommand) -> Option<&str> {
    match command {
        StoreCommand::Set { key, .. }
        | StoreCommand::Delete { key }
        | StoreCommand::SetAdd { key, .. }
        | StoreCommand::SetRemove { key, .. }
        | StoreCommand::Expire { key, .. } => Some(key.as_str()),
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::Backend(format!("WRONGTYPE operation against key {key}"))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.ensure_available()?;
        let now = Instant::now();
        let data = self.data.read();
        match data.get(key) {
            Some(slot) if slot.is_expired(now) => Ok(None),
            Some(Slot {
                entry: Entry::Value(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_available()?;
        let now = Instant::now();
        let data = self.data.read();
        match data.get(key) {
            Some(slot) if slot.is_expired(now) => Ok(Vec::new()),
            Some(Slot {
                entry: Entry::Set(members),
                ..
            }) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn exec_atomic(&self, commands: &[StoreCommand]) -> Result<(), StoreError> {
        self.ensure_available()?;
        let now = Instant::now();
        let mut data = self.data.write();

        // Only a type mismatch can fail, so check the whole batch before
        // touching anything.
        Self::validate(&data, commands, now)?;
        for command in commands {
            Self::apply(&mut data, command, now)?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store
            .exec_atomic(&[StoreCommand::set("k", "v", HOUR)])
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_values_read_as_missing_and_sweep() {
        let store = MemoryStore::new();
        store
            .exec_atomic(&[StoreCommand::set("short", "v", Duration::from_millis(10))])
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.sweep_expired(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_membership_and_removal() {
        let store = MemoryStore::new();
        store
            .exec_atomic(&[
                StoreCommand::set_add("idx", "a"),
                StoreCommand::set_add("idx", "b"),
                StoreCommand::set_remove("idx", "a"),
            ])
            .await
            .unwrap();

        assert_eq!(store.set_members("idx").await.unwrap(), vec!["b".to_string()]);

        store
            .exec_atomic(&[StoreCommand::set_remove("idx", "b")])
            .await
            .unwrap();
        assert!(!store.contains_key("idx"));
    }

    #[tokio::test]
    async fn batch_type_checks_follow_earlier_commands() {
        let store = MemoryStore::new();
        store.insert_raw("plain", "value");

        store
            .exec_atomic(&[
                StoreCommand::delete("plain"),
                StoreCommand::set_add("plain", "member"),
            ])
            .await
            .unwrap();
        assert_eq!(
            store.set_members("plain").await.unwrap(),
            vec!["member".to_string()]
        );

        let result = store
            .exec_atomic(&[
                StoreCommand::set("fresh", "1", HOUR),
                StoreCommand::set_remove("fresh", "member"),
            ])
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(!store.contains_key("fresh"));
    }

    #[tokio::test]
    async fn failing_batch_applies_nothing() {
        let store = MemoryStore::new();
        store.insert_raw("plain", "value");

        let result = store
            .exec_atomic(&[
                StoreCommand::set("first", "1", HOUR),
                StoreCommand::set_add("plain", "member"),
            ])
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(!store.contains_key("first"));
    }

    #[tokio::test]
    async fn expire_sets_ttl_on_existing_key() {
        let store = MemoryStore::new();
        store
            .exec_atomic(&[
                StoreCommand::set_add("idx", "a"),
                StoreCommand::expire("idx", HOUR),
                StoreCommand::expire("missing", HOUR),
            ])
            .await
            .unwrap();

        let ttl = store.ttl("idx").unwrap();
        assert!(ttl <= HOUR && ttl > HOUR - Duration::from_secs(5));
        assert!(!store.contains_key("missing"));
    }

    #[tokio::test]
    async fn unavailable_store_rejects_everything_but_keeps_data() {
        let store = MemoryStore::new();
        store.insert_raw("k", "v");
        store.set_available(false);

        assert!(store.ping().await.is_err());
        assert!(store.get("k").await.is_err());
        assert!(store.set_members("idx").await.is_err());
        assert!(store.exec_atomic(&[StoreCommand::delete("k")]).await.is_err());

        store.set_available(true);
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }
}
