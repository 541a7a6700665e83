use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the schema on an open pool. Every statement is idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per accepted trade line; the unique key is the dedup identity.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trade_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trade_timestamp_utc TEXT NOT NULL,
            log_hash TEXT NOT NULL,
            nick TEXT NOT NULL,
            trade_type TEXT NOT NULL,
            message TEXT NOT NULL,
            message_normalized TEXT NOT NULL,
            server TEXT NOT NULL DEFAULT '',
            ingested_at INTEGER NOT NULL,
            UNIQUE(trade_timestamp_utc, log_hash)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trade_logs_nick ON trade_logs(nick)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trade_logs_server ON trade_logs(server)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_trade_logs_timestamp ON trade_logs(trade_timestamp_utc DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
