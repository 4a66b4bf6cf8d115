//! Composition root: wires the store, tracker and repository from config.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::memory::MemoryStore;
use crate::application::order::OrderTracker;
use crate::application::position::{PositionStateRepository, RecoveryMonitor};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::store::KeyValueStore;

/// The order tracker and position repository sharing one store.
pub struct StateLayer {
    store: Arc<dyn KeyValueStore>,
    tracker: Arc<OrderTracker>,
    positions: Arc<PositionStateRepository>,
    recovery: RecoveryMonitor,
}

impl StateLayer {
    /// Build the layer from configuration.
    ///
    /// Uses Redis when `store.url` is set. A server that is down at startup
    /// leaves the repository degraded; the recovery monitor started by
    /// [`StateLayer::start`] resyncs once it is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not a valid Redis URL, or when a URL
    /// is configured but the binary was built without the `redis` feature.
    #[allow(clippy::result_large_err)]
    pub async fn build(config: &Config) -> Result<Self> {
        match connect(config).await? {
            Some(store) => Ok(Self::with_store(config, store).await),
            None => Ok(Self::memory_only(config)),
        }
    }

    /// Build the layer over an already constructed primary store.
    ///
    /// The repository probes `store` once and starts degraded if it is down.
    pub async fn with_store(config: &Config, store: Arc<dyn KeyValueStore>) -> Self {
        let positions = Arc::new(
            PositionStateRepository::new(
                store.clone(),
                config.key_layout(),
                config.positions.settings(&config.store),
            )
            .await,
        );
        Self::assemble(config, store, positions)
    }

    /// Build a layer backed by an in-process store.
    #[must_use]
    pub fn memory_only(config: &Config) -> Self {
        info!("No primary store configured, running memory-only");
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let positions = Arc::new(PositionStateRepository::memory_only());
        Self::assemble(config, store, positions)
    }

    fn assemble(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        positions: Arc<PositionStateRepository>,
    ) -> Self {
        let tracker = Arc::new(OrderTracker::new(
            store.clone(),
            config.key_layout(),
            config.tracker.settings(),
        ));
        let recovery = RecoveryMonitor::new(positions.clone());
        Self {
            store,
            tracker,
            positions,
            recovery,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<OrderTracker> {
        &self.tracker
    }

    #[must_use]
    pub fn positions(&self) -> &Arc<PositionStateRepository> {
        &self.positions
    }

    #[must_use]
    pub fn recovery(&self) -> &RecoveryMonitor {
        &self.recovery
    }

    /// Start the order timeout monitor and, with a store, the recovery monitor.
    pub fn start(&self) {
        self.tracker.start_monitor();
        if self.positions.store().is_some() {
            self.recovery.start();
        }
    }

    /// Stop both monitors and wait for them to exit.
    pub async fn shutdown(&self) {
        self.tracker.stop_monitor().await;
        self.recovery.stop().await;
    }
}

#[cfg(feature = "redis")]
async fn connect(config: &Config) -> Result<Option<Arc<dyn KeyValueStore>>> {
    use crate::adapter::outbound::redis::RedisStore;

    let Some(url) = &config.store.url else {
        return Ok(None);
    };

    let store = RedisStore::connect(url, config.store.operation_timeout()).await?;
    Ok(Some(Arc::new(store)))
}

#[cfg(not(feature = "redis"))]
async fn connect(config: &Config) -> Result<Option<Arc<dyn KeyValueStore>>> {
    use crate::error::ConfigError;
    use tracing::warn;

    if config.store.url.is_some() {
        warn!("store.url is set but redis support is not compiled in");
        return Err(ConfigError::InvalidValue {
            field: "url",
            reason: "built without the `redis` feature".to_string(),
        }
        .into());
    }
    Ok(None)
}
