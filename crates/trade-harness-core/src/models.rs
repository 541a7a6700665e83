//! Core data models that flow through ingestion and search.
//!
//! [`RawLine`] and [`CanonicalRecord`] belong to the ingestion side;
//! [`QueryableItem`] is the unit the search side indexes and filters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade intent announced at the start of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    /// Want to sell.
    Wts,
    /// Want to buy.
    Wtb,
    /// Want to trade.
    Wtt,
    /// Price check. Also carries `@TORTA-` verification tokens.
    Pc,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Wts => "WTS",
            TradeType::Wtb => "WTB",
            TradeType::Wtt => "WTT",
            TradeType::Pc => "PC",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WTS" => Ok(TradeType::Wts),
            "WTB" => Ok(TradeType::Wtb),
            "WTT" => Ok(TradeType::Wtt),
            "PC" => Ok(TradeType::Pc),
            other => anyhow::bail!("unknown trade type: '{}'", other),
        }
    }
}

/// Fields extracted from one raw log line, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// `HH:MM:SS` exactly as it appeared in the log.
    pub time_of_day: String,
    pub nick_raw: String,
    pub server_code: String,
    pub message_raw: String,
    /// 1-based position in the source file, for diagnostics.
    pub line_number: usize,
}

/// A canonical, deduplicatable trade record.
///
/// Identity for deduplication is `(trade_timestamp_utc, content_hash)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// ISO 8601 UTC, millisecond precision: `2025-12-01T07:07:08.000Z`.
    pub trade_timestamp_utc: String,
    /// Lowercased, trimmed nick.
    pub nick: String,
    pub server_code: String,
    pub trade_type: Option<TradeType>,
    pub message_clean: String,
    pub message_normalized: String,
    /// 8 upper-case hex digits.
    pub content_hash: String,
}

impl CanonicalRecord {
    /// The deduplication key used by every [`TradeStore`](crate::store::TradeStore).
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.trade_timestamp_utc, &self.content_hash)
    }
}

/// A market listing loaded into memory for a search session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryableItem {
    pub id: String,
    pub name: String,
    pub material: String,
    pub quality: f64,
    pub rarity: String,
    /// Unit price in copper.
    pub price: i64,
    pub quantity: i64,
    pub order_type: String,
    pub seller: String,
    pub location: String,
    pub timestamp: String,
}

/// Placeholder value for unknown item fields; never indexed.
pub const UNKNOWN: &str = "Unknown";

impl QueryableItem {
    /// An item with every optional field set to its neutral default.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            material: UNKNOWN.to_string(),
            quality: 50.0,
            rarity: "Common".to_string(),
            price: 0,
            quantity: 1,
            order_type: "UNKNOWN".to_string(),
            seller: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            timestamp: String::new(),
        }
    }
}
