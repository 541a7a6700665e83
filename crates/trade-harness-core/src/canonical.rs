//! Canonicalization of parsed log lines into [`CanonicalRecord`]s.
//!
//! # Classification
//!
//! The message prefix decides what a line is. Rules are checked top to
//! bottom and the first match wins:
//!
//! | Prefix | Class | Result |
//! |--------|-------|--------|
//! | `WTS`/`WTB`/`WTT`/`PC` + whitespace (any case) | [`MessageClass::Trade`] | that type, prefix consumed |
//! | `@TORTA-` | [`MessageClass::VerificationToken`] | `PC`, message kept intact |
//! | any other `@` | [`MessageClass::Reply`] | rejected |
//! | anything else | [`MessageClass::Invalid`] | rejected |
//!
//! # Timestamps
//!
//! A log line carries only `HH:MM:SS`. The full timestamp is that time on
//! the caller-supplied processing date, in UTC. Every line of one file is
//! assumed to fall on the same calendar day and no timezone conversion is
//! applied.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::fingerprint::content_hash;
use crate::grammar::parse_line;
use crate::models::{CanonicalRecord, RawLine, TradeType};

/// Prefix of in-game verification tokens.
pub const VERIFICATION_TOKEN_PREFIX: &str = "@TORTA-";

/// Normalized messages shorter than this are noise, unless the line is `PC`.
pub const MIN_NORMALIZED_LEN: usize = 5;

fn trade_prefix_regex() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"(?i)^(WTS|WTB|WTT|PC)\s+").expect("trade prefix regex is valid")
    })
}

fn legacy_code_regex() -> &'static Regex {
    static LEGACY: OnceLock<Regex> = OnceLock::new();
    LEGACY.get_or_init(|| {
        Regex::new(r"(?i)@tortaapp\s+\d+").expect("legacy verification regex is valid")
    })
}

/// What a message prefix says about the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageClass<'a> {
    /// A trade announcement; `rest` is the message after the prefix.
    Trade { trade_type: TradeType, rest: &'a str },
    /// An `@TORTA-` verification token, kept whole.
    VerificationToken { message: &'a str },
    /// A reply to another player (`@nick ...`).
    Reply,
    /// No recognized trade prefix.
    Invalid,
}

/// Classify a trimmed message by its prefix.
pub fn classify_message(message: &str) -> MessageClass<'_> {
    if let Some(caps) = trade_prefix_regex().captures(message) {
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
        if let Ok(trade_type) = caps[1].parse::<TradeType>() {
            return MessageClass::Trade {
                trade_type,
                rest: message[whole..].trim(),
            };
        }
    }
    if message.starts_with(VERIFICATION_TOKEN_PREFIX) {
        return MessageClass::VerificationToken { message };
    }
    if message.starts_with('@') {
        return MessageClass::Reply;
    }
    MessageClass::Invalid
}

/// Why a line did not become a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The line does not follow the log grammar.
    Malformed,
    /// The message is a reply to another player.
    Reply,
    /// The message has no recognized trade prefix.
    Unclassified,
    /// The normalized message is too short to be a real trade.
    TooShort,
    /// `HH:MM:SS` is out of range (e.g. `25:00:00`).
    InvalidTime,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Malformed => "line does not match the log grammar",
            Rejection::Reply => "reply message",
            Rejection::Unclassified => "no trade prefix",
            Rejection::TooShort => "message too short",
            Rejection::InvalidTime => "time of day out of range",
        };
        f.write_str(reason)
    }
}

/// Lowercase, keep `[a-z0-9]` and whitespace, collapse whitespace runs.
pub fn normalize_text(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove legacy `@tortaapp <digits>` codes.
pub fn strip_legacy_codes(message: &str) -> String {
    legacy_code_regex().replace_all(message, "").trim().to_string()
}

/// Combine a processing date with `HH:MM:SS` into an ISO 8601 UTC string.
pub fn trade_timestamp(date: NaiveDate, time_of_day: &str) -> Option<String> {
    let time = NaiveTime::parse_from_str(time_of_day, "%H:%M:%S").ok()?;
    Some(
        date.and_time(time)
            .and_utc()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string(),
    )
}

/// Turn a parsed line into a canonical record.
pub fn canonicalize(
    raw: &RawLine,
    processing_date: NaiveDate,
) -> Result<CanonicalRecord, Rejection> {
    let nick = raw.nick_raw.trim().to_lowercase();
    let message = raw.message_raw.trim();

    let (trade_type, message_clean) = match classify_message(message) {
        MessageClass::Trade { trade_type, rest } => (trade_type, strip_legacy_codes(rest)),
        MessageClass::VerificationToken { message } => (TradeType::Pc, message.to_string()),
        MessageClass::Reply => return Err(Rejection::Reply),
        MessageClass::Invalid => return Err(Rejection::Unclassified),
    };

    let message_normalized = normalize_text(&message_clean);
    if message_normalized.len() < MIN_NORMALIZED_LEN && trade_type != TradeType::Pc {
        return Err(Rejection::TooShort);
    }

    let trade_timestamp_utc =
        trade_timestamp(processing_date, &raw.time_of_day).ok_or(Rejection::InvalidTime)?;
    let content_hash = content_hash(&raw.time_of_day, &nick, &message_normalized);

    Ok(CanonicalRecord {
        trade_timestamp_utc,
        nick,
        server_code: raw.server_code.clone(),
        trade_type: Some(trade_type),
        message_clean,
        message_normalized,
        content_hash,
    })
}

/// Parse and canonicalize a single log line.
pub fn process_log_line(
    line: &str,
    processing_date: NaiveDate,
    line_number: usize,
) -> Result<CanonicalRecord, Rejection> {
    let raw = parse_line(line, line_number).ok_or(Rejection::Malformed)?;
    canonicalize(&raw, processing_date)
}

/// Line accounting for one processed log text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Every line in the input, blank ones included.
    pub total: usize,
    pub valid: usize,
    /// Non-blank lines that were malformed or rejected.
    pub ignored: usize,
}

/// Records and accounting produced from one log text.
#[derive(Debug, Clone, Default)]
pub struct LogBatch {
    pub records: Vec<CanonicalRecord>,
    pub stats: LogStats,
}

/// Process a whole log text. Blank lines are skipped without being counted
/// as ignored.
pub fn process_log_text(text: &str, processing_date: NaiveDate) -> LogBatch {
    let mut batch = LogBatch::default();

    for (i, line) in text.split('\n').enumerate() {
        batch.stats.total += 1;
        if line.trim().is_empty() {
            continue;
        }
        match process_log_line(line, processing_date, i + 1) {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                tracing::trace!(line = i + 1, %reason, "line ignored");
                batch.stats.ignored += 1;
            }
        }
    }

    batch.stats.valid = batch.records.len();
    batch
}
