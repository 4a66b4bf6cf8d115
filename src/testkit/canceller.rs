//! Recording canceller for tracker tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::OrderId;
use crate::error::{Error, Result};
use crate::port::outbound::canceller::OrderCanceller;

/// Records every cancel request. Fails each call while `failing` is set.
#[derive(Debug, Default)]
pub struct RecordingCanceller {
    calls: Mutex<Vec<(String, OrderId)>>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingCanceller {
    /// A canceller whose calls succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A canceller whose calls fail with [`Error::Cancel`].
    pub fn failing() -> Self {
        let canceller = Self::default();
        canceller.set_failing(true);
        canceller
    }

    /// A canceller that takes `delay` to answer each call.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every `(symbol, order_id)` seen so far, in call order.
    pub fn calls(&self) -> Vec<(String, OrderId)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl OrderCanceller for RecordingCanceller {
    async fn cancel(&self, symbol: &str, order_id: OrderId) -> Result<()> {
        self.calls.lock().push((symbol.to_string(), order_id));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Cancel {
                symbol: symbol.to_string(),
                order_id,
                reason: "exchange rejected cancel".into(),
            });
        }
        Ok(())
    }
}
