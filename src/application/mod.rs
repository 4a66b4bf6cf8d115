//! Application services (use cases).
//!
//! The order tracker and the position repository coordinate the store port,
//! the availability flag and the in-memory cache.

pub mod availability;
pub mod cache;
pub mod keys;
pub(crate) mod monitor;
pub mod order;
pub mod position;
