//! Primary store port: a key-value store with TTL, sets and atomic batches.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Set a string value, replacing any previous value and TTL.
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },
    /// Delete a key of any kind.
    Delete { key: String },
    /// Add a member to a set, creating the set if needed.
    SetAdd { key: String, member: String },
    /// Remove a member from a set.
    SetRemove { key: String, member: String },
    /// Refresh the TTL of an existing key.
    Expire { key: String, ttl: Duration },
}

impl StoreCommand {
    pub fn set(key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    pub fn set_add(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SetAdd {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn set_remove(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SetRemove {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn expire(key: impl Into<String>, ttl: Duration) -> Self {
        Self::Expire {
            key: key.into(),
            ttl,
        }
    }
}

/// Key-value store used as the durable, shared tier.
///
/// Implementations must bound every call in time and must apply
/// [`exec_atomic`](Self::exec_atomic) batches wholly or not at all.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Health probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Read a string value. `Ok(None)` is a definitive miss.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// List the members of a set. A missing set is empty.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Apply a batch of writes as one transaction.
    async fn exec_atomic(&self, commands: &[StoreCommand]) -> Result<(), StoreError>;

    /// Short backend name for logs and stats.
    fn backend_name(&self) -> &'static str;
}
