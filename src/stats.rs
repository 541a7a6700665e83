//! Database statistics overview.
//!
//! Summarizes what has been ingested: total trades, breakdowns by server
//! and trade type, and the size of the search index a session would build
//! over the stored corpus. Used by `trade stats` to confirm ingests landed.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use trade_harness_core::corpus::items_from_trades;
use trade_harness_core::search::SearchSession;
use trade_harness_core::store::TradeStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteTradeStore;

async fn grouped_counts(pool: &SqlitePool, column: &str) -> Result<Vec<(String, i64)>> {
    // `column` is always one of our own literals, never user input.
    let sql = format!(
        "SELECT {col} AS key, COUNT(*) AS n FROM trade_logs GROUP BY {col} ORDER BY n DESC, key ASC",
        col = column
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("key"), row.get::<i64, _>("n")))
        .collect())
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trade_logs")
        .fetch_one(&pool)
        .await?;
    let last_ingest: Option<i64> = sqlx::query_scalar("SELECT MAX(ingested_at) FROM trade_logs")
        .fetch_one(&pool)
        .await?;
    let by_server = grouped_counts(&pool, "server").await?;
    let by_type = grouped_counts(&pool, "trade_type").await?;

    let store = SqliteTradeStore::new(pool);
    let session = SearchSession::new(items_from_trades(&store.load_trades(None).await?));
    let index = session.stats();

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Trade Harness - Database Stats");
    println!("==============================");
    println!();
    println!("  Database:      {}", config.db.path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!();
    println!("  Trades:        {}", total);
    println!(
        "  Last ingest:   {}",
        last_ingest
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    println!(
        "  Index:         {} items, {} unique tokens",
        index.total_items, index.unique_tokens
    );

    for (title, rows) in [("By server:", &by_server), ("By trade type:", &by_type)] {
        if rows.is_empty() {
            continue;
        }
        println!();
        println!("  {}", title);
        for (key, n) in rows {
            let key = if key.is_empty() { "(none)" } else { key.as_str() };
            println!("    {:<16} {:>8}", key, n);
        }
    }

    println!();

    store.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
