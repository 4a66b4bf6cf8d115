//! Position state persistence with graceful degradation.

mod recovery;
mod repository;

pub use recovery::RecoveryMonitor;
pub use repository::{
    PositionStateRepository, RepositorySettings, RepositoryStats, DEFAULT_POSITION_TTL,
};
