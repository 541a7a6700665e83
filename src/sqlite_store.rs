//! SQLite-backed [`TradeStore`].
//!
//! Each call to [`insert_ignore_conflicts`](TradeStore::insert_ignore_conflicts)
//! runs in one transaction. Rows whose `(trade_timestamp_utc, log_hash)`
//! already exist are skipped by `ON CONFLICT DO NOTHING`, and the affected
//! row count of each statement tells whether that record was inserted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use trade_harness_core::models::{CanonicalRecord, TradeType};
use trade_harness_core::store::TradeStore;

pub struct SqliteTradeStore {
    pool: SqlitePool,
}

impl SqliteTradeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn insert_ignore_conflicts(
        &self,
        records: &[CanonicalRecord],
    ) -> Result<Vec<CanonicalRecord>> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::new();

        for record in records {
            let trade_type = record.trade_type.map(|t| t.as_str()).unwrap_or("UNKNOWN");
            let result = sqlx::query(
                r#"
                INSERT INTO trade_logs (trade_timestamp_utc, log_hash, nick, trade_type, message, message_normalized, server, ingested_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(trade_timestamp_utc, log_hash) DO NOTHING
                "#,
            )
            .bind(&record.trade_timestamp_utc)
            .bind(&record.content_hash)
            .bind(&record.nick)
            .bind(trade_type)
            .bind(&record.message_clean)
            .bind(&record.message_normalized)
            .bind(&record.server_code)
            .bind(now)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!(
                    "Failed to insert trade {} / {}",
                    record.trade_timestamp_utc, record.content_hash
                )
            })?;

            if result.rows_affected() == 1 {
                inserted.push(record.clone());
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn load_trades(&self, limit: Option<i64>) -> Result<Vec<CanonicalRecord>> {
        // SQLite treats a negative LIMIT as "no limit".
        let rows = sqlx::query(
            r#"
            SELECT trade_timestamp_utc, log_hash, nick, trade_type, message, message_normalized, server
            FROM trade_logs
            ORDER BY trade_timestamp_utc ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .iter()
            .map(|row| {
                let trade_type: String = row.get("trade_type");
                CanonicalRecord {
                    trade_timestamp_utc: row.get("trade_timestamp_utc"),
                    nick: row.get("nick"),
                    server_code: row.get("server"),
                    trade_type: trade_type.parse::<TradeType>().ok(),
                    message_clean: row.get("message"),
                    message_normalized: row.get("message_normalized"),
                    content_hash: row.get("log_hash"),
                }
            })
            .collect();
        Ok(records)
    }
}
