//! Pre-cleaned bulk trade exports (NDJSON).
//!
//! Each non-blank line is decoded and parsed independently as one JSON
//! object. A line that is not UTF-8, not valid JSON, or lacks a timestamp,
//! nick or message, counts as a parse error and is skipped; the rest of the
//! file still loads.
//!
//! # Field aliases
//!
//! | Record field | Accepted keys |
//! |--------------|---------------|
//! | timestamp | `timestamp`, `trade_timestamp_utc` |
//! | nick | `player`, `nick`, `game_nick` |
//! | trade type | `trade_type`, `type` |
//! | message | `message`, `message_clean`, `raw_text` |
//! | server | `server`, `server_code` |
//! | hash | `log_hash`, `content_hash` |
//!
//! Timestamps may be RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) or
//! epoch milliseconds, and are re-rendered in the canonical
//! `%Y-%m-%dT%H:%M:%S%.3fZ` form.
//!
//! A line without a hash gets a synthetic CRC-32 fingerprint. That value is
//! weak: distinct trades can collide and silently dedup against each other.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::canonical::{classify_message, normalize_text, MessageClass};
use crate::fingerprint::content_hash;
use crate::models::{CanonicalRecord, TradeType};

const TIMESTAMP_KEYS: &[&str] = &["timestamp", "trade_timestamp_utc"];
const NICK_KEYS: &[&str] = &["player", "nick", "game_nick"];
const TYPE_KEYS: &[&str] = &["trade_type", "type"];
const MESSAGE_KEYS: &[&str] = &["message", "message_clean", "raw_text"];
const SERVER_KEYS: &[&str] = &["server", "server_code"];
const HASH_KEYS: &[&str] = &["log_hash", "content_hash"];

/// Result of parsing one bulk file.
#[derive(Debug, Clone, Default)]
pub struct BulkParse {
    /// Records with a known trade type, ready for submission.
    pub records: Vec<CanonicalRecord>,
    /// Non-blank lines seen.
    pub total_lines: usize,
    pub parse_errors: usize,
    /// Parsed lines whose hash had to be synthesized.
    pub synthetic_hashes: usize,
    /// Parsed lines dropped because no trade type could be determined.
    pub untyped: usize,
}

/// Why a single bulk line could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkLineError {
    InvalidUtf8,
    InvalidJson(String),
    NotAnObject,
    MissingField(&'static str),
    BadTimestamp(String),
}

impl std::fmt::Display for BulkLineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BulkLineError::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
            BulkLineError::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            BulkLineError::NotAnObject => f.write_str("line is not a JSON object"),
            BulkLineError::MissingField(name) => write!(f, "missing field: {}", name),
            BulkLineError::BadTimestamp(ts) => write!(f, "unrecognized timestamp: '{}'", ts),
        }
    }
}

/// One parsed bulk line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLine {
    pub record: CanonicalRecord,
    pub synthetic_hash: bool,
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Normalize any accepted timestamp representation.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(ms) = value.as_i64() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Trade type from the explicit field, falling back to the message prefix.
fn resolve_trade_type(explicit: Option<&str>, message: &str) -> Option<TradeType> {
    if let Some(t) = explicit.and_then(|t| t.parse::<TradeType>().ok()) {
        return Some(t);
    }
    match classify_message(message) {
        MessageClass::Trade { trade_type, .. } => Some(trade_type),
        MessageClass::VerificationToken { .. } => Some(TradeType::Pc),
        MessageClass::Reply | MessageClass::Invalid => None,
    }
}

/// Parse one NDJSON line.
pub fn parse_bulk_line(line: &str) -> Result<BulkLine, BulkLineError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| BulkLineError::InvalidJson(e.to_string()))?;
    let obj = value.as_object().ok_or(BulkLineError::NotAnObject)?;

    let ts_value = TIMESTAMP_KEYS
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
        .ok_or(BulkLineError::MissingField("timestamp"))?;
    let timestamp =
        parse_timestamp(ts_value).ok_or_else(|| BulkLineError::BadTimestamp(ts_value.to_string()))?;

    let nick = first_str(obj, NICK_KEYS)
        .ok_or(BulkLineError::MissingField("nick"))?
        .to_lowercase();
    let message_clean = first_str(obj, MESSAGE_KEYS)
        .ok_or(BulkLineError::MissingField("message"))?
        .to_string();
    let server_code = first_str(obj, SERVER_KEYS).unwrap_or_default().to_string();
    let trade_type = resolve_trade_type(first_str(obj, TYPE_KEYS), &message_clean);

    let message_normalized = normalize_text(&message_clean);
    let (content_hash, synthetic_hash) = match first_str(obj, HASH_KEYS) {
        Some(hash) => (hash.to_string(), false),
        None => {
            let time_of_day = timestamp.format("%H:%M:%S").to_string();
            (content_hash(&time_of_day, &nick, &message_normalized), true)
        }
    };

    Ok(BulkLine {
        record: CanonicalRecord {
            trade_timestamp_utc: timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            nick,
            server_code,
            trade_type,
            message_clean,
            message_normalized,
            content_hash,
        },
        synthetic_hash,
    })
}

/// Parse a whole NDJSON text. Blank lines are skipped and not counted.
pub fn parse_bulk_text(text: &str) -> BulkParse {
    parse_bulk_bytes(text.as_bytes())
}

/// Parse raw NDJSON file contents, decoding each line on its own.
pub fn parse_bulk_bytes(bytes: &[u8]) -> BulkParse {
    let mut out = BulkParse::default();

    for (i, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let decoded = std::str::from_utf8(raw).map(str::trim);
        if matches!(decoded, Ok("")) {
            continue;
        }
        out.total_lines += 1;

        let parsed = decoded
            .map_err(|_| BulkLineError::InvalidUtf8)
            .and_then(parse_bulk_line);
        match parsed {
            Ok(parsed) => {
                if parsed.synthetic_hash {
                    out.synthetic_hashes += 1;
                }
                if parsed.record.trade_type.is_some() {
                    out.records.push(parsed.record);
                } else {
                    out.untyped += 1;
                }
            }
            Err(e) => {
                tracing::debug!(line = i + 1, error = %e, "bulk line skipped");
                out.parse_errors += 1;
            }
        }
    }

    if out.synthetic_hashes > 0 {
        tracing::warn!(
            count = out.synthetic_hashes,
            "bulk lines without a hash got a synthetic CRC-32 fingerprint; collisions are possible"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_and_explicit_hash() {
        let line = r#"{"trade_timestamp_utc":"2025-12-01T07:07:08Z","game_nick":"Jotasiete","type":"wts","message_clean":"Iron Lump 1s","server_code":"Har","log_hash":"DEADBEEF"}"#;
        let parsed = parse_bulk_line(line).unwrap();
        assert!(!parsed.synthetic_hash);
        let r = parsed.record;
        assert_eq!(r.trade_timestamp_utc, "2025-12-01T07:07:08.000Z");
        assert_eq!(r.nick, "jotasiete");
        assert_eq!(r.trade_type, Some(TradeType::Wts));
        assert_eq!(r.server_code, "Har");
        assert_eq!(r.content_hash, "DEADBEEF");
        assert_eq!(r.message_normalized, "iron lump 1s");
    }

    #[test]
    fn synthetic_hash_matches_log_fingerprint() {
        let line = r#"{"timestamp":"2025-12-01 07:07:08","player":"Jotasiete","trade_type":"WTS","message":"Iron Lump 1s","server":"Har"}"#;
        let parsed = parse_bulk_line(line).unwrap();
        assert!(parsed.synthetic_hash);
        assert_eq!(parsed.record.content_hash, "3C978729");
    }

    #[test]
    fn epoch_millis_timestamp() {
        let line = r#"{"timestamp":1764572828000,"nick":"a","message":"WTB stone bricks"}"#;
        let r = parse_bulk_line(line).unwrap().record;
        assert_eq!(r.trade_timestamp_utc, "2025-12-01T07:07:08.000Z");
        assert_eq!(r.trade_type, Some(TradeType::Wtb));
        assert_eq!(r.server_code, "");
    }

    #[test]
    fn missing_fields_are_errors() {
        assert_eq!(
            parse_bulk_line(r#"{"player":"a","message":"WTS x"}"#),
            Err(BulkLineError::MissingField("timestamp"))
        );
        assert_eq!(
            parse_bulk_line(r#"{"timestamp":"2025-12-01T00:00:00Z","message":"WTS x"}"#),
            Err(BulkLineError::MissingField("nick"))
        );
        assert!(matches!(
            parse_bulk_line(r#"{"timestamp":"yesterday","player":"a","message":"x"}"#),
            Err(BulkLineError::BadTimestamp(_))
        ));
        assert_eq!(parse_bulk_line("[1,2]"), Err(BulkLineError::NotAnObject));
    }

    #[test]
    fn whole_file_accounting() {
        let text = [
            r#"{"timestamp":"2025-12-01T07:00:00Z","player":"a","trade_type":"WTS","message":"iron lump","log_hash":"00000001"}"#,
            "{not json",
            "",
            r#"{"timestamp":"2025-12-01T07:00:01Z","player":"b","message":"hello everyone"}"#,
            r#"{"timestamp":"2025-12-01T07:00:02Z","player":"c","message":"PC stone brick"}"#,
        ]
        .join("\n");
        let parsed = parse_bulk_text(&text);
        assert_eq!(parsed.total_lines, 4);
        assert_eq!(parsed.parse_errors, 1);
        assert_eq!(parsed.untyped, 1);
        assert_eq!(parsed.synthetic_hashes, 2);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].trade_type, Some(TradeType::Pc));
    }

    #[test]
    fn undecodable_line_is_a_parse_error() {
        let mut bytes =
            br#"{"timestamp":"2025-12-01T07:00:00Z","player":"a","message":"WTS iron lump"}"#
                .to_vec();
        bytes.extend_from_slice(b"\r\n{\"player\":\"b\xff\"}\n\n");
        let parsed = parse_bulk_bytes(&bytes);
        assert_eq!(parsed.total_lines, 2);
        assert_eq!(parsed.parse_errors, 1);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].nick, "a");
    }
}
