//! In-game price notation.
//!
//! Prices are written as amounts of nested denominations, e.g. `1g 2s 50c`.
//! Everything is normalized to copper:
//!
//! | Unit | Copper |
//! |------|--------|
//! | `g` (gold) | 10 000 |
//! | `s` (silver) | 100 |
//! | `c` (copper) | 1 |
//! | `i` (iron) | 0.01 |

use regex::Regex;
use std::sync::OnceLock;

fn denomination_regex() -> &'static Regex {
    static DENOM: OnceLock<Regex> = OnceLock::new();
    DENOM.get_or_init(|| Regex::new(r"([\d.]+)\s*([gsci])").expect("denomination regex is valid"))
}

fn leading_quantity_regex() -> &'static Regex {
    static QTY: OnceLock<Regex> = OnceLock::new();
    QTY.get_or_init(|| Regex::new(r"(?i)^(\d+)[x\s]+(.+)").expect("quantity regex is valid"))
}

/// Normalize a price string into copper. Unparsable input is `0.0`.
///
/// A bare number (`"150"`, `"1,5"`) is taken as copper already.
pub fn normalize_price(raw: &str) -> f64 {
    let s = raw.trim().to_lowercase();
    if s.is_empty() || s == "nan" || s == "none" {
        return 0.0;
    }

    let clean = s.replacen(',', ".", 1);
    if let Ok(direct) = clean.parse::<f64>() {
        if direct.is_finite() {
            return direct;
        }
    }

    let mut total = 0.0;
    for caps in denomination_regex().captures_iter(&clean) {
        let Ok(value) = caps[1].parse::<f64>() else {
            continue;
        };
        total += match &caps[2] {
            "g" => value * 10_000.0,
            "s" => value * 100.0,
            "c" => value,
            "i" => value / 100.0,
            _ => 0.0,
        };
    }
    total
}

/// Find the first price notation in free text, in copper.
///
/// Only tokens made entirely of amount/unit pairs count, so words like
/// `"bricks"` are never mistaken for prices.
pub fn extract_price(text: &str) -> Option<f64> {
    text.split_whitespace()
        .map(|tok| tok.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '.'))
        .filter(|tok| is_price_token(tok))
        .map(normalize_price)
        .find(|copper| *copper > 0.0)
}

fn is_price_token(tok: &str) -> bool {
    let lower = tok.to_lowercase();
    let Some(last) = lower.chars().last() else {
        return false;
    };
    if !matches!(last, 'g' | 's' | 'c' | 'i') {
        return false;
    }
    let consumed: usize = denomination_regex()
        .find_iter(&lower)
        .map(|m| m.as_str().len())
        .sum();
    consumed == lower.len() && lower.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Split a leading quantity off an item name: `"100x stone"` → `(stone, 100)`.
pub fn extract_name_and_qty(item_name: &str) -> (String, i64) {
    if item_name.is_empty() {
        return (String::new(), 1);
    }
    if let Some(caps) = leading_quantity_regex().captures(item_name) {
        if let Ok(qty) = caps[1].parse::<i64>() {
            return (caps[2].trim().to_string(), qty);
        }
    }
    (item_name.to_string(), 1)
}
