#![allow(dead_code)]

use std::sync::Arc;

use tradestate::adapter::outbound::memory::MemoryStore;
use tradestate::application::keys::KeyLayout;
use tradestate::application::order::OrderTracker;
use tradestate::application::position::PositionStateRepository;
use tradestate::testkit;

/// Tracker over a fresh memory store with a fast scan interval.
pub fn tracker() -> (Arc<MemoryStore>, Arc<OrderTracker>) {
    let store = Arc::new(MemoryStore::new());
    let tracker = Arc::new(OrderTracker::new(
        store.clone(),
        KeyLayout::default(),
        testkit::config::fast_tracker(),
    ));
    (store, tracker)
}

/// Repository over a fresh, healthy memory store.
pub async fn repository() -> (Arc<MemoryStore>, Arc<PositionStateRepository>) {
    let store = Arc::new(MemoryStore::new());
    let repository = PositionStateRepository::new(
        store.clone(),
        KeyLayout::default(),
        testkit::config::fast_repository(),
    )
    .await;
    (store, Arc::new(repository))
}
