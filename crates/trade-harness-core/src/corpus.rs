//! Loading a search corpus of [`QueryableItem`]s.
//!
//! Two sources are supported:
//!
//! - **Trade files** exported from the market tools: either one JSON array
//!   or newline-delimited JSON objects. Chat boilerplate is filtered out.
//! - **Stored trade logs**: canonical records read back from a
//!   [`TradeStore`](crate::store::TradeStore).
//!
//! Item ids are corpus positions rendered as strings.

use serde_json::Value;

use crate::models::{CanonicalRecord, QueryableItem, UNKNOWN};
use crate::price::{extract_name_and_qty, extract_price, normalize_price};

/// Channel boilerplate that shows up in exported trade chat.
const NOISE_TERMS: &[&str] = &[
    "you can disable receiving these messages",
    "view the full trade chat etiquette",
    "please pm the person if you",
    "this is the trade channel",
    "only messages starting with wtb, wts",
    "you can also use @<name> to",
];

/// True when `text` contains channel boilerplate.
pub fn is_noise(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    NOISE_TERMS.iter().any(|term| lower.contains(term))
}

fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn field_str(record: &Value, keys: &[&str]) -> String {
    match field(record, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Raw JSON records from a trade file.
///
/// A text that looks like a JSON array is parsed as one; anything else (or
/// an array that fails to parse) is read line by line, skipping lines that
/// are not valid JSON.
pub fn read_trade_records(text: &str) -> Vec<Value> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(Value::Array(records)) = serde_json::from_str::<Value>(trimmed) {
            if !records.is_empty() {
                return records;
            }
        }
    }

    let mut records = Vec::new();
    let mut invalid = 0usize;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => records.push(value),
            Err(_) => invalid += 1,
        }
    }
    if invalid > 0 {
        tracing::debug!(invalid, "skipped trade file lines that are not JSON");
    }
    records
}

/// Map one exported trade record onto an item, or `None` if it is noise.
fn item_from_record(record: &Value) -> Option<QueryableItem> {
    let raw_text = field_str(record, &["raw_text", "raw"]);
    let item_name = field_str(record, &["main_item", "item_name"]);
    if is_noise(&raw_text) || is_noise(&item_name) {
        return None;
    }

    let (name, quantity) = extract_name_and_qty(&item_name);
    let price = field(record, &["price_s", "price_raw", "price_str", "price"])
        .map(|v| match v {
            Value::String(s) => normalize_price(s),
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        })
        .unwrap_or(0.0);

    let order_type = if raw_text.is_empty() {
        "UNKNOWN"
    } else if raw_text.to_lowercase().starts_with("wtb") {
        "WTB"
    } else {
        "WTS"
    };

    let name = if name.is_empty() {
        UNKNOWN.to_string()
    } else {
        name
    };
    let mut item = QueryableItem::named(String::new(), name);
    item.price = price.round() as i64;
    item.quantity = quantity;
    item.order_type = order_type.to_string();
    let seller = field_str(record, &["player", "sender"]);
    if !seller.is_empty() {
        item.seller = seller;
    }
    item.timestamp = field_str(record, &["timestamp"]);
    Some(item)
}

/// Parse a trade file into a corpus.
pub fn parse_trade_file(text: &str) -> Vec<QueryableItem> {
    let records = read_trade_records(text);
    if records.is_empty() {
        tracing::warn!("no trade records found; file is empty or in an unknown format");
        return Vec::new();
    }

    let total = records.len();
    let items: Vec<QueryableItem> = records
        .iter()
        .filter_map(item_from_record)
        .enumerate()
        .map(|(i, mut item)| {
            item.id = i.to_string();
            item
        })
        .collect();
    tracing::debug!(total, kept = items.len(), "parsed trade file");
    items
}

/// Strip price tokens from the end of a trade message to get an item name.
fn item_name_from_message(message: &str) -> String {
    let mut words: Vec<&str> = message.split_whitespace().collect();
    while let Some(last) = words.last() {
        if extract_price(last).is_some() {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

/// Turn stored trade logs into a searchable corpus.
///
/// The message (minus trailing prices) becomes the item name, the nick the
/// seller, the server the location. The first price notation in the message
/// becomes the price.
pub fn items_from_trades(records: &[CanonicalRecord]) -> Vec<QueryableItem> {
    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let (name, quantity) =
                extract_name_and_qty(&item_name_from_message(&rec.message_clean));
            let name = if name.is_empty() {
                rec.message_clean.clone()
            } else {
                name
            };
            let mut item = QueryableItem::named(i.to_string(), name);
            item.price = extract_price(&rec.message_clean).unwrap_or(0.0).round() as i64;
            item.quantity = quantity;
            item.order_type = rec
                .trade_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            item.seller = rec.nick.clone();
            if !rec.server_code.is_empty() {
                item.location = rec.server_code.clone();
            }
            item.timestamp = rec.trade_timestamp_utc.clone();
            item
        })
        .collect()
}
