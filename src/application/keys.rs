//! Store key layout.
//!
//! ```text
//! {prefix}:pending_order:{symbol}:{order_id}   order record
//! {prefix}:pending_orders:list                 set of order record keys
//! {prefix}:position:{user_id}:{symbol}         position record
//! {prefix}:positions:{user_id}:list            set of symbols with a record
//! ```

use crate::domain::OrderId;

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "tradestate";

/// Builds store keys under a common prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn pending_order(&self, symbol: &str, order_id: OrderId) -> String {
        format!("{}:pending_order:{symbol}:{order_id}", self.prefix)
    }

    #[must_use]
    pub fn pending_order_index(&self) -> String {
        format!("{}:pending_orders:list", self.prefix)
    }

    #[must_use]
    pub fn position(&self, user_id: &str, symbol: &str) -> String {
        format!("{}:position:{user_id}:{symbol}", self.prefix)
    }

    #[must_use]
    pub fn position_index(&self, user_id: &str) -> String {
        format!("{}:positions:{user_id}:list", self.prefix)
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}
