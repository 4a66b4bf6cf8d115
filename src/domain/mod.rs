//! Trading state records owned by the engine and persisted by this crate.

mod ids;
mod money;
mod order;
mod position;

pub use ids::{OrderId, PositionKey};
pub use money::{Price, Profit, Quantity};
pub use order::{NewPendingOrder, OrderSide, PendingOrder, DEFAULT_ORDER_TIMEOUT_SECS};
pub use position::{PositionState, ReentryCycle, ReentryState};
