//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the two collaborators the state layer depends on:
//! the primary key-value store and the exchange-side order canceller.

pub mod canceller;
pub mod store;
