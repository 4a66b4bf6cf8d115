//! Builders for domain records used across tests.
//!
//! Keeps tests focused on assertions rather than construction boilerplate.

use chrono::Utc;
use rust_decimal_macros::dec;

use crate::domain::{
    NewPendingOrder, OrderId, OrderSide, PositionState, ReentryCycle, ReentryState,
};

/// A one-lot `LIMIT` buy at 100 with no explicit timeout.
pub fn order_request(symbol: &str, order_id: OrderId) -> NewPendingOrder {
    NewPendingOrder::new(symbol, order_id, OrderSide::Buy, "LIMIT", dec!(100), dec!(1))
        .with_source("test")
}

/// A long `scalp` position at TP level 0.
pub fn position(symbol: &str) -> PositionState {
    PositionState::new(symbol, OrderSide::Buy, "scalp")
}

/// A long position at `tp_level` with two recorded re-entry cycles.
pub fn position_with_reentry(symbol: &str, tp_level: u32) -> PositionState {
    let started = Utc::now();
    let cycle = |number: u32| ReentryCycle {
        cycle_number: number,
        entry_price: dec!(100),
        entry_quantity: dec!(2),
        tp_hit_price: Some(dec!(102)),
        tp_hit_quantity: Some(dec!(1)),
        realized_profit: dec!(2),
        reentry_triggered: number == 1,
        reentry_price: (number == 1).then_some(dec!(101)),
        reentry_quantity: (number == 1).then_some(dec!(1)),
        cycle_start_time: started,
        cycle_end_time: (number == 1).then_some(started),
    };

    let mut state = position(symbol);
    state.current_tp_level = tp_level;
    state.reentry = Some(ReentryState {
        enabled: true,
        current_cycle: 2,
        cycles: vec![cycle(1), cycle(2)],
        accumulated_profit: dec!(4),
        tp_level_unlocked: tp_level,
        next_tp_blocked: false,
        original_entry_price: dec!(100),
        current_breakeven: dec!(98),
        remaining_quantity: dec!(1),
        dynamic_sl_active: true,
        dynamic_sl_price: dec!(99.5),
        protected_profit: dec!(1.5),
    });
    state
}
