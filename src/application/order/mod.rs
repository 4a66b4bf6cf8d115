//! Pending order tracking with timeout-driven cancellation.

mod monitor;
mod tracker;

pub use tracker::{OrderTracker, TrackerSettings, TrackerStats};
