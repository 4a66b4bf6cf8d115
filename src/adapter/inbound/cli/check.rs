//! `tradestate check`: probe the primary store.

use serde_json::json;

use super::output;
use crate::error::{Result, StoreError};
use crate::infrastructure::bootstrap::StateLayer;

/// Probe the store and report repository health.
///
/// Fails when a store is configured but does not answer. Memory-only
/// operation is reported, not treated as a failure.
pub async fn execute(layer: &StateLayer) -> Result<()> {
    let positions = layer.positions();
    let configured = positions.store().is_some();
    let healthy = positions.check_store_connection().await;
    let stats = positions.stats();

    if output::is_json() {
        output::json_output(json!({
            "command": "check",
            "configured": configured,
            "healthy": healthy,
            "backend": stats.backend,
            "state": stats.store_state,
        }));
    } else {
        output::section("Store");
        output::field("backend", output::highlight(stats.backend));
        output::field(
            "state",
            if healthy {
                output::positive(stats.store_state)
            } else {
                output::negative(stats.store_state)
            },
        );
    }

    if !configured {
        output::note("No store configured; state lives in memory only");
        return Ok(());
    }
    if !healthy {
        output::error("Store is not reachable");
        return Err(StoreError::Unavailable("health check failed".into()).into());
    }
    output::success("Store reachable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::settings::Config;

    #[tokio::test]
    async fn memory_only_check_passes() {
        let layer = StateLayer::memory_only(&Config::default());
        execute(&layer).await.unwrap();
    }
}
