//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`canceller`]: `RecordingCanceller`, an [`OrderCanceller`](crate::port::outbound::canceller::OrderCanceller)
//!   that records calls and can be told to fail.
//! - [`domain`]: Builders for order requests and position state.
//! - [`config`]: Fast tracker and repository settings.

pub mod canceller;
pub mod config;
pub mod domain;
