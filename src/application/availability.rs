//! Primary-store availability flag.
//!
//! One instance per repository. Checked before every store access without a
//! lock: a caller that reads "healthy" just before another flips it pays at
//! most one extra failed store call.
//!
//! Every degradation bumps an epoch. A store call that succeeded may only
//! flip the flag back if no degradation happened since it started, so a slow
//! read cannot undo a concurrent failure and skip the resync.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Observable store state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Healthy,
    /// The in-memory cache is authoritative.
    Degraded,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreState::Healthy => write!(f, "healthy"),
            StoreState::Degraded => write!(f, "degraded"),
        }
    }
}

/// Atomic `Healthy ⇄ Degraded` state machine.
#[derive(Debug)]
pub struct StoreHealth {
    /// Low bit: healthy. Remaining bits: degradation epoch.
    word: AtomicU64,
}

const HEALTHY: u64 = 1;

impl StoreHealth {
    #[must_use]
    pub const fn new(initial: StoreState) -> Self {
        let healthy = matches!(initial, StoreState::Healthy);
        Self {
            word: AtomicU64::new(healthy as u64),
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.word.load(Ordering::SeqCst) & HEALTHY != 0
    }

    #[must_use]
    pub fn state(&self) -> StoreState {
        if self.is_healthy() {
            StoreState::Healthy
        } else {
            StoreState::Degraded
        }
    }

    /// Number of degradations so far. Capture before a store call and pass to
    /// [`StoreHealth::mark_healthy_since`] afterwards.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.word.load(Ordering::SeqCst) >> 1
    }

    /// Flip to healthy. Returns true on a degraded → healthy transition.
    pub fn mark_healthy(&self) -> bool {
        self.word.fetch_or(HEALTHY, Ordering::SeqCst) & HEALTHY == 0
    }

    /// Flip to healthy unless a degradation happened after `epoch` was read.
    /// Returns true on a degraded → healthy transition.
    pub fn mark_healthy_since(&self, epoch: u64) -> bool {
        self.word
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
                (word >> 1 == epoch).then_some(word | HEALTHY)
            })
            .is_ok_and(|prev| prev & HEALTHY == 0)
    }

    /// Flip to degraded and start a new epoch. Returns true on a
    /// healthy → degraded transition.
    pub fn mark_degraded(&self) -> bool {
        let prev = self
            .word
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
                Some(((word >> 1).wrapping_add(1)) << 1)
            })
            .unwrap_or_else(|word| word);
        prev & HEALTHY != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_reported_once() {
        let health = StoreHealth::new(StoreState::Healthy);

        assert!(health.mark_degraded());
        assert!(!health.mark_degraded());
        assert_eq!(health.state(), StoreState::Degraded);

        assert!(health.mark_healthy());
        assert!(!health.mark_healthy());
        assert!(health.is_healthy());
    }

    #[test]
    fn stale_success_does_not_undo_degradation() {
        let health = StoreHealth::new(StoreState::Healthy);
        let seen = health.epoch();

        health.mark_degraded();
        assert!(!health.mark_healthy_since(seen));
        assert!(!health.is_healthy());

        let seen = health.epoch();
        assert!(health.mark_healthy_since(seen));
        assert!(health.is_healthy());
        assert!(!health.mark_healthy_since(seen));
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = StoreHealth::new(StoreState::Healthy);
        let b = StoreHealth::new(StoreState::Healthy);

        a.mark_degraded();

        assert!(!a.is_healthy());
        assert!(b.is_healthy());
    }

    #[test]
    fn state_display() {
        assert_eq!(StoreState::Degraded.to_string(), "degraded");
    }
}
