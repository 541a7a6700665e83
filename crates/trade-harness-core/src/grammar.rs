//! Raw trade-chat line grammar.
//!
//! ```text
//! [HH:MM:SS] <Nick> (ServerCode) Message
//! ```
//!
//! Whitespace between the bracketed parts is optional and the server code
//! is alphabetic. A line that does not match is not an error: callers
//! simply count it as ignored.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::RawLine;

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^\[(\d{2}:\d{2}:\d{2})\]\s*<([^>]+)>\s*\(([A-Za-z]+)\)\s*(.*)$")
            .expect("line grammar regex is valid")
    })
}

/// Match one line against the grammar.
///
/// The line is trimmed before matching. Returns `None` when the line does
/// not follow the format.
pub fn parse_line(line: &str, line_number: usize) -> Option<RawLine> {
    let caps = line_regex().captures(line.trim())?;

    Some(RawLine {
        time_of_day: caps[1].to_string(),
        nick_raw: caps[2].to_string(),
        server_code: caps[3].to_string(),
        message_raw: caps[4].to_string(),
        line_number,
    })
}
