//! In-memory caches backing degraded-mode operation.

pub mod position;
