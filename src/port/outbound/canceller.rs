//! Order cancellation port, implemented by the order-execution component.

use async_trait::async_trait;

use crate::domain::OrderId;
use crate::error::Result;

/// Cancels an order on the exchange.
///
/// Invoked by the timeout monitor at most once per detected timeout.
#[async_trait]
pub trait OrderCanceller: Send + Sync {
    async fn cancel(&self, symbol: &str, order_id: OrderId) -> Result<()>;
}

#[async_trait]
impl<F> OrderCanceller for F
where
    F: Fn(&str, OrderId) -> Result<()> + Send + Sync,
{
    async fn cancel(&self, symbol: &str, order_id: OrderId) -> Result<()> {
        self(symbol, order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn closures_are_cancellers() {
        let ok = |_: &str, _: OrderId| -> Result<()> { Ok(()) };
        let failing = |symbol: &str, order_id: OrderId| -> Result<()> {
            Err(Error::Cancel {
                symbol: symbol.to_string(),
                order_id,
                reason: "unknown order".into(),
            })
        };

        assert!(ok.cancel("BTCUSDT", 1).await.is_ok());
        let err = failing.cancel("BTCUSDT", 7).await.unwrap_err();
        assert!(err.to_string().contains("order 7"));
    }
}
