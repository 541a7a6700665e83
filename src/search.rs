//! `trade search`: structured search over a trade corpus.
//!
//! The corpus is either a trade file given with `--file` (JSON array or
//! NDJSON) or every trade stored in the database. Either way it is loaded
//! into a fresh [`SearchSession`] for the one query.

use anyhow::{Context, Result};
use std::path::Path;

use trade_harness_core::corpus::{items_from_trades, parse_trade_file};
use trade_harness_core::models::QueryableItem;
use trade_harness_core::search::SearchSession;
use trade_harness_core::store::TradeStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteTradeStore;

/// Load the corpus for a search or suggest command.
pub async fn load_corpus(config: &Config, file: Option<&Path>) -> Result<Vec<QueryableItem>> {
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trade file: {}", path.display()))?;
        return Ok(parse_trade_file(&text));
    }

    let pool = db::connect(config).await?;
    let store = SqliteTradeStore::new(pool);
    let trades = store
        .load_trades(None)
        .await
        .context("Failed to load trades; has `trade init` been run?")?;
    store.pool().close().await;
    Ok(items_from_trades(&trades))
}

/// Render a copper amount in denominations: `10250` → `1g 2s 50c`.
pub fn format_copper(copper: i64) -> String {
    if copper <= 0 {
        return "-".to_string();
    }
    let gold = copper / 10_000;
    let silver = (copper % 10_000) / 100;
    let rest = copper % 100;

    let mut parts = Vec::new();
    if gold > 0 {
        parts.push(format!("{}g", gold));
    }
    if silver > 0 {
        parts.push(format!("{}s", silver));
    }
    if rest > 0 {
        parts.push(format!("{}c", rest));
    }
    parts.join(" ")
}

pub async fn run_search(
    config: &Config,
    query: &str,
    file: Option<&Path>,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let final_limit = limit.unwrap_or(config.search.final_limit).max(1) as usize;
    let session = SearchSession::new(load_corpus(config, file).await?);
    let results = session.query(query, final_limit);

    tracing::debug!(
        text = %results.query.text_query,
        filters = results.query.filters.len(),
        matches = results.total_matches,
        "search complete"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.items.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, item) in results.items.iter().enumerate() {
        println!(
            "{}. [{}] {} x{}  {}",
            i + 1,
            item.order_type,
            item.name,
            item.quantity,
            format_copper(item.price)
        );
        println!("    seller: {}", item.seller);
        println!("    quality: {}  rarity: {}", item.quality, item.rarity);
        if !item.timestamp.is_empty() {
            println!("    at: {} ({})", item.timestamp, item.location);
        }
        println!();
    }
    println!(
        "{} of {} matches",
        results.items.len(),
        results.total_matches
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copper_formatting() {
        assert_eq!(format_copper(0), "-");
        assert_eq!(format_copper(50), "50c");
        assert_eq!(format_copper(100), "1s");
        assert_eq!(format_copper(10_250), "1g 2s 50c");
    }
}
