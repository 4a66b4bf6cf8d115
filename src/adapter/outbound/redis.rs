//! Redis adapter for the primary store port.
//!
//! The [`ConnectionManager`] is created lazily on the first call that reaches
//! the server, so a store that is down at startup is picked up once it comes
//! back. After that the manager re-establishes dropped connections itself.
//! Every call is bounded by the configured operation timeout; batches run
//! inside `MULTI`/`EXEC`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::port::outbound::store::{KeyValueStore, StoreCommand};

/// Redis-backed [`KeyValueStore`].
pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisStore {
    /// Open a store for `url` (e.g. `redis://127.0.0.1:6379/0`) and try a
    /// first connection, bounded by `op_timeout`.
    ///
    /// An unreachable server is logged, not returned: later calls fail with a
    /// store error until a connection succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when `url` is not a valid Redis URL.
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, StoreError> {
        let store = Self {
            client: redis::Client::open(url)?,
            conn: OnceCell::new(),
            op_timeout,
        };

        match bounded("connect", op_timeout, store.connection()).await {
            Ok(_) => info!(timeout_ms = millis(op_timeout), "Connected to Redis"),
            Err(e) => warn!(error = %e, "Redis unreachable, will retry on next call"),
        }
        Ok(store)
    }

    /// Returns true once a connection has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.initialized()
    }

    /// Shared connection, established on first use.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.conn
            .get_or_try_init(|| async {
                let conn = ConnectionManager::new(self.client.clone()).await?;
                debug!("Established Redis connection");
                Ok::<_, StoreError>(conn)
            })
            .await
            .cloned()
    }

    fn pipeline(commands: &[StoreCommand]) -> redis::Pipeline {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            match command {
                StoreCommand::Set { key, value, ttl } => {
                    pipe.cmd("SET")
                        .arg(key)
                        .arg(value)
                        .arg("PX")
                        .arg(millis(*ttl))
                        .ignore();
                }
                StoreCommand::Delete { key } => {
                    pipe.cmd("DEL").arg(key).ignore();
                }
                StoreCommand::SetAdd { key, member } => {
                    pipe.cmd("SADD").arg(key).arg(member).ignore();
                }
                StoreCommand::SetRemove { key, member } => {
                    pipe.cmd("SREM").arg(key).arg(member).ignore();
                }
                StoreCommand::Expire { key, ttl } => {
                    pipe.cmd("PEXPIRE").arg(key).arg(millis(*ttl)).ignore();
                }
            }
        }
        pipe
    }
}

fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> Result<(), StoreError> {
        bounded("ping", self.op_timeout, async {
            let mut conn = self.connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        bounded("get", self.op_timeout, async {
            let mut conn = self.connection().await?;
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        bounded("smembers", self.op_timeout, async {
            let mut conn = self.connection().await?;
            let members: Vec<String> = redis::cmd("SMEMBERS")
                .arg(key)
                .query_async(&mut conn)
                .await?;
            Ok(members)
        })
        .await
    }

    async fn exec_atomic(&self, commands: &[StoreCommand]) -> Result<(), StoreError> {
        if commands.is_empty() {
            return Ok(());
        }
        let pipe = Self::pipeline(commands);
        bounded("exec", self.op_timeout, async {
            let mut conn = self.connection().await?;
            let _: () = pipe.query_async(&mut conn).await?;
            Ok(())
        })
        .await?;

        debug!(commands = commands.len(), "Executed atomic batch");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_never_zero() {
        assert_eq!(millis(Duration::from_micros(10)), 1);
        assert_eq!(millis(Duration::from_secs(240)), 240_000);
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let result: Result<(), StoreError> = bounded("ping", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(StoreError::Timeout {
                operation: "ping",
                after_ms: 10
            })
        ));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_connecting() {
        let result = RedisStore::connect("not a url", Duration::from_millis(50)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unreachable_server_still_yields_a_store() {
        let store = RedisStore::connect("redis://127.0.0.1:1/0", Duration::from_millis(200))
            .await
            .unwrap();

        assert!(!store.is_connected());
        assert!(store.ping().await.is_err());
        assert!(store.get("key").await.is_err());
        assert!(!store.is_connected());
    }
}
