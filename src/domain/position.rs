//! Persisted position state: take-profit progress and re-entry cycles.
//!
//! The trading engine owns every field here. The state layer only stores and
//! returns owned copies, so these types are plain data with `Clone`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderSide, Price, Profit, Quantity};

/// State of an open position that must survive restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub symbol: String,
    pub side: OrderSide,
    /// Trading-mode tag, e.g. `scalp` or `swing`.
    pub mode: String,
    /// Highest take-profit level reached; never decreases while open.
    pub current_tp_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentry: Option<ReentryState>,
    /// Stamped by the repository on every save.
    pub saved_at: DateTime<Utc>,
}

impl PositionState {
    /// Create state for a freshly opened position.
    pub fn new(symbol: impl Into<String>, side: OrderSide, mode: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            mode: mode.into(),
            current_tp_level: 0,
            reentry: None,
            saved_at: Utc::now(),
        }
    }

    /// Returns true if re-entry bookkeeping is attached and enabled.
    #[must_use]
    pub fn reentry_enabled(&self) -> bool {
        self.reentry.as_ref().is_some_and(|r| r.enabled)
    }
}

/// Re-entry progress for a position that scales out at TP and buys back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReentryState {
    pub enabled: bool,
    pub current_cycle: u32,
    #[serde(default)]
    pub cycles: Vec<ReentryCycle>,
    pub accumulated_profit: Profit,
    pub tp_level_unlocked: u32,
    pub next_tp_blocked: bool,
    pub original_entry_price: Price,
    pub current_breakeven: Price,
    pub remaining_quantity: Quantity,
    pub dynamic_sl_active: bool,
    pub dynamic_sl_price: Price,
    pub protected_profit: Profit,
}

impl ReentryState {
    /// The cycle currently in progress, if any.
    #[must_use]
    pub fn active_cycle(&self) -> Option<&ReentryCycle> {
        self.cycles
            .iter()
            .rev()
            .find(|c| c.cycle_number == self.current_cycle)
    }

    /// Sum of profit realized across all recorded cycles.
    #[must_use]
    pub fn realized_total(&self) -> Profit {
        self.cycles.iter().map(|c| c.realized_profit).sum()
    }
}

/// One partial close at TP followed by an optional buy-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReentryCycle {
    pub cycle_number: u32,
    pub entry_price: Price,
    pub entry_quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_hit_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_hit_quantity: Option<Quantity>,
    pub realized_profit: Profit,
    pub reentry_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentry_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentry_quantity: Option<Quantity>,
    pub cycle_start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_end_time: Option<DateTime<Utc>>,
}

impl ReentryCycle {
    /// Returns true once the cycle has an end time.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cycle_end_time.is_some()
    }
}
