//! Tradestate - crash-safe trading state for an automated trading engine.
//!
//! Two services share one primary key-value store:
//!
//! - [`application::order::OrderTracker`] records unfilled orders with a
//!   deadline and cancels them through a registered
//!   [`port::outbound::canceller::OrderCanceller`] once they time out.
//! - [`application::position::PositionStateRepository`] persists per-user
//!   position state (take-profit level, re-entry cycles) and keeps serving
//!   reads and writes from an in-memory cache while the store is down.
//!
//! # Modules
//!
//! - [`domain`] - Order and position records
//! - [`port`] - Store and canceller traits
//! - [`adapter`] - Redis and in-memory stores, operator CLI
//! - [`application`] - Tracker, repository, availability and monitors
//! - [`infrastructure`] - Configuration and wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `redis` (default) - Redis-backed store
//! - `testkit` - Test fixtures for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tradestate::adapter::outbound::memory::MemoryStore;
//! use tradestate::application::keys::KeyLayout;
//! use tradestate::application::order::{OrderTracker, TrackerSettings};
//!
//! let tracker = Arc::new(OrderTracker::new(
//!     Arc::new(MemoryStore::new()),
//!     KeyLayout::default(),
//!     TrackerSettings::default(),
//! ));
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
