//! Storage abstraction for trade records.
//!
//! The batch ingestor depends on exactly one write semantic: an
//! insert keyed by `(trade_timestamp_utc, content_hash)` that skips
//! conflicting rows and reports back the rows it actually inserted.
//! Success and duplicate counts are derived from that report, so every
//! backend must honour it precisely.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::CanonicalRecord;

/// Abstract storage backend for canonical trade records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_ignore_conflicts`](TradeStore::insert_ignore_conflicts) | Insert a batch, skipping existing keys |
/// | [`load_trades`](TradeStore::load_trades) | Read stored records back for a search session |
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Insert `records`, ignoring any whose `(trade_timestamp_utc,
    /// content_hash)` already exists (in the store or earlier in the same
    /// batch).
    ///
    /// Returns exactly the records that were inserted. An `Err` means the
    /// whole batch failed and nothing from it was committed.
    async fn insert_ignore_conflicts(
        &self,
        records: &[CanonicalRecord],
    ) -> Result<Vec<CanonicalRecord>>;

    /// Load stored records in timestamp order, newest last.
    async fn load_trades(&self, limit: Option<i64>) -> Result<Vec<CanonicalRecord>>;
}
