//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Architecture
//!
//! ```text
//!      trading engine
//!            │
//!            ▼
//!  ┌──────────────────────────┐
//!  │       Application        │
//!  │  OrderTracker            │
//!  │  PositionStateRepository │
//!  └─────┬──────────────┬─────┘
//!        │              │
//!        ▼              ▼
//!  ┌───────────┐  ┌────────────┐
//!  │ KeyValue  │  │   Order    │
//!  │  Store    │  │ Canceller  │
//!  └───────────┘  └────────────┘
//! ```

pub mod outbound;
