//! In-memory [`TradeStore`] implementation for tests and dry runs.
//!
//! Keeps records in insertion order behind a `std::sync::RwLock`, with a
//! key set for conflict detection.

use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::CanonicalRecord;

use super::TradeStore;

/// In-memory store with the same conflict semantics as the SQLite store.
pub struct InMemoryTradeStore {
    keys: RwLock<HashSet<(String, String)>>,
    rows: RwLock<Vec<CanonicalRecord>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashSet::new()),
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTradeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn insert_ignore_conflicts(
        &self,
        records: &[CanonicalRecord],
    ) -> Result<Vec<CanonicalRecord>> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;

        let mut inserted = Vec::new();
        for record in records {
            let key = (
                record.trade_timestamp_utc.clone(),
                record.content_hash.clone(),
            );
            if keys.insert(key) {
                rows.push(record.clone());
                inserted.push(record.clone());
            }
        }
        Ok(inserted)
    }

    async fn load_trades(&self, limit: Option<i64>) -> Result<Vec<CanonicalRecord>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let mut out = rows.clone();
        out.sort_by(|a, b| a.trade_timestamp_utc.cmp(&b.trade_timestamp_utc));
        if let Some(lim) = limit {
            out.truncate(lim.max(0) as usize);
        }
        Ok(out)
    }
}
