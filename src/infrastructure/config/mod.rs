//! Infrastructure configuration modules.

pub mod logging;
pub mod positions;
pub mod settings;
pub mod store;
pub mod tracker;
