//! `tradestate orders`: list pending orders.

use chrono::Utc;
use serde_json::json;

use super::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::StateLayer;

/// Print tracked orders, oldest first, followed by tracker stats.
pub async fn execute(layer: &StateLayer) -> Result<()> {
    let tracker = layer.tracker();
    let orders = tracker.get_all().await?;
    let stats = tracker.stats().await;

    if output::is_json() {
        output::json_output(json!({
            "command": "orders",
            "orders": orders,
            "stats": stats,
        }));
        return Ok(());
    }

    output::section("Pending orders");
    if orders.is_empty() {
        output::note("No orders tracked");
    }
    let now = Utc::now();
    for order in &orders {
        let remaining = (order.timeout_at() - now).num_seconds();
        let deadline = if remaining > 0 {
            output::positive(format!("{remaining}s left"))
        } else {
            output::negative("overdue")
        };
        output::field(
            &format!("{}#{}", order.symbol(), order.order_id()),
            format!(
                "{} {} {} @ {} ({deadline})",
                order.side(),
                order.quantity(),
                order.order_type(),
                order.price()
            ),
        );
    }

    output::section("Tracker");
    output::field("pending", stats.pending_count);
    output::field("timeout", format!("{}s", stats.timeout_secs));
    output::field("check interval", format!("{}s", stats.check_interval_secs));
    for (symbol, count) in &stats.by_symbol {
        output::field(symbol, count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::settings::Config;
    use crate::testkit;

    #[tokio::test]
    async fn lists_tracked_orders() {
        let layer = StateLayer::memory_only(&Config::default());
        layer
            .tracker()
            .track(testkit::domain::order_request("BTCUSDT", 9))
            .await
            .unwrap();

        execute(&layer).await.unwrap();
    }
}
