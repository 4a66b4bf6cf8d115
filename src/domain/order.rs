//! Pending order records tracked until fill, cancel or timeout.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderId, Price, Quantity};
use crate::error::{Error, Result};

/// Timeout applied when an order does not carry its own (3 minutes).
pub const DEFAULT_ORDER_TIMEOUT_SECS: i64 = 180;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Caller-supplied description of an order to track.
///
/// Everything except the deadline, which the tracker derives.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingOrder {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    /// Exchange order type, e.g. `LIMIT`.
    pub order_type: String,
    pub price: Price,
    pub quantity: Quantity,
    /// Originating strategy tag.
    pub source: String,
    /// Defaults to the time of tracking.
    pub placed_at: Option<DateTime<Utc>>,
    /// Values `<= 0` fall back to the tracker default.
    pub timeout_secs: i64,
    pub description: String,
}

impl NewPendingOrder {
    /// Create a request with no explicit timeout, source or description.
    pub fn new(
        symbol: impl Into<String>,
        order_id: OrderId,
        side: OrderSide,
        order_type: impl Into<String>,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_id,
            symbol: symbol.into(),
            side,
            order_type: order_type.into(),
            price,
            quantity,
            source: String::new(),
            placed_at: None,
            timeout_secs: 0,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: i64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn placed_at(mut self, placed_at: DateTime<Utc>) -> Self {
        self.placed_at = Some(placed_at);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An order awaiting fill, with its cancellation deadline.
///
/// `timeout_at` is always `placed_at + timeout_secs`; fields are private so
/// the deadline cannot drift from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    order_id: OrderId,
    symbol: String,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: String,
    price: Price,
    quantity: Quantity,
    source: String,
    placed_at: DateTime<Utc>,
    timeout_secs: i64,
    timeout_at: DateTime<Utc>,
    description: String,
}

impl PendingOrder {
    /// Build a tracked order from a request.
    ///
    /// `default_timeout_secs` applies when the request's timeout is not
    /// positive; `now` stands in for a missing placement time.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] when the deadline does not fit in a timestamp.
    pub fn from_request(
        request: NewPendingOrder,
        default_timeout_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let timeout_secs = if request.timeout_secs > 0 {
            request.timeout_secs
        } else if default_timeout_secs > 0 {
            default_timeout_secs
        } else {
            DEFAULT_ORDER_TIMEOUT_SECS
        };
        let placed_at = request.placed_at.unwrap_or(now);
        let timeout_at = Duration::try_seconds(timeout_secs)
            .and_then(|timeout| placed_at.checked_add_signed(timeout))
            .ok_or_else(|| Error::InvalidValue {
                field: "timeout_secs",
                reason: format!("deadline {timeout_secs}s after placement is out of range"),
            })?;

        Ok(Self {
            order_id: request.order_id,
            symbol: request.symbol,
            side: request.side,
            order_type: request.order_type,
            price: request.price,
            quantity: request.quantity,
            source: request.source,
            placed_at,
            timeout_secs,
            timeout_at,
            description: request.description,
        })
    }

    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn side(&self) -> OrderSide {
        self.side
    }

    #[must_use]
    pub fn order_type(&self) -> &str {
        &self.order_type
    }

    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    #[must_use]
    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }

    #[must_use]
    pub fn timeout_at(&self) -> DateTime<Utc> {
        self.timeout_at
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// True once `now` is strictly past the deadline.
    #[must_use]
    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        now > self.timeout_at
    }

    /// Time elapsed since placement.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.placed_at
    }
}
