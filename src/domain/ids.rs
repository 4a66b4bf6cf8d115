//! Identifier types for tracked state.

use std::fmt;

/// Exchange order identifier.
pub type OrderId = i64;

/// Structured key of a position state: one record per (user, symbol).
///
/// Carried alongside cached values so the user and symbol never have to be
/// recovered by splitting a joined string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    user_id: String,
    symbol: String,
}

impl PositionKey {
    /// Create a new key.
    pub fn new(user_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            symbol: symbol.into(),
        }
    }

    /// The owning user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The traded symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns true if the key belongs to `user_id`.
    #[must_use]
    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_colons_stay_distinct() {
        let a = PositionKey::new("tenant:1", "BTCUSDT");
        let b = PositionKey::new("tenant", "1:BTCUSDT");

        assert_ne!(a, b);
        assert_eq!(a.user_id(), "tenant:1");
        assert_eq!(b.symbol(), "1:BTCUSDT");
    }

    #[test]
    fn belongs_to_is_exact_match() {
        let key = PositionKey::new("user-10", "ETHUSDT");

        assert!(key.belongs_to("user-10"));
        assert!(!key.belongs_to("user-1"));
    }

    #[test]
    fn display_joins_with_slash() {
        let key = PositionKey::new("u1", "SOLUSDT");
        assert_eq!(key.to_string(), "u1/SOLUSDT");
    }
}
