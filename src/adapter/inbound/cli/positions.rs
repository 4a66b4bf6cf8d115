//! `tradestate positions --user <id>`: list a user's position states.

use serde_json::json;

use super::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::StateLayer;

pub async fn execute(layer: &StateLayer, user_id: &str) -> Result<()> {
    let repository = layer.positions();
    let positions = repository.load_all_positions(user_id).await?;
    let stats = repository.stats();

    if output::is_json() {
        output::json_output(json!({
            "command": "positions",
            "user_id": user_id,
            "positions": positions,
            "stats": stats,
        }));
        return Ok(());
    }

    output::section(&format!("Positions for {user_id}"));
    if positions.is_empty() {
        output::note("No open positions");
    }
    let mut symbols: Vec<_> = positions.keys().collect();
    symbols.sort();
    for symbol in symbols {
        let state = &positions[symbol];
        let reentry = match &state.reentry {
            Some(r) if r.enabled => format!(", re-entry cycle {}", r.current_cycle),
            _ => String::new(),
        };
        output::field(
            symbol,
            format!(
                "{} {} TP{}{reentry} (saved {})",
                state.side,
                state.mode,
                state.current_tp_level,
                state.saved_at.format("%Y-%m-%d %H:%M:%S")
            ),
        );
    }

    output::section("Repository");
    output::field("backend", stats.backend);
    output::field("state", stats.store_state);
    output::field("cached", stats.in_memory_cache_size);
    if !stats.store_available {
        output::warning("Store unavailable, showing in-memory cache");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::settings::Config;
    use crate::testkit;

    #[tokio::test]
    async fn lists_cached_positions() {
        let layer = StateLayer::memory_only(&Config::default());
        layer
            .positions()
            .save_position_state("u1", "BTCUSDT", &testkit::domain::position("BTCUSDT"))
            .await
            .unwrap();

        execute(&layer, "u1").await.unwrap();
        assert!(execute(&layer, "").await.is_err());
    }
}
