//! Fuzzy item-name matching for autocomplete and suggestions.
//!
//! # Scoring
//!
//! | Case | Score |
//! |------|-------|
//! | exact match | 100 |
//! | target starts with query | 95 |
//! | target contains query | 90 |
//! | otherwise | `round(similarity × 70)`, +20 if a target word starts with the query, capped at 100 |
//!
//! `similarity = 1 − levenshtein(query, target) / max(len)`. Comparisons
//! are case-insensitive and ignore surrounding whitespace. Suggestions
//! scoring below [`MIN_SCORE`] are dropped.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::QueryableItem;

/// Suggestions scoring below this are excluded.
pub const MIN_SCORE: u32 = 30;

/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Score how well `query` matches `target`, 0–100.
pub fn fuzzy_score(query: &str, target: &str) -> u32 {
    let q = query.trim().to_lowercase();
    let t = target.trim().to_lowercase();

    if q == t {
        return 100;
    }
    if t.starts_with(&q) {
        return 95;
    }
    if t.contains(&q) {
        return 90;
    }

    let max_len = q.chars().count().max(t.chars().count());
    let similarity = 1.0 - levenshtein(&q, &t) as f64 / max_len as f64;
    let word_bonus = if t.split_whitespace().any(|w| w.starts_with(&q)) {
        20
    } else {
        0
    };

    ((similarity * 70.0).round() as u32 + word_bonus).min(100)
}

/// Keyword category of an item name, for display grouping.
pub fn categorize_item(name: &str) -> &'static str {
    let n = name.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|k| n.contains(k));

    if has(&["brick"]) {
        "Bricks"
    } else if has(&["plank", "wood"]) {
        "Wood"
    } else if has(&["iron", "steel", "metal"]) {
        "Metals"
    } else if has(&["stone", "rock"]) {
        "Stone"
    } else if has(&["nail", "rivet"]) {
        "Hardware"
    } else if has(&["tool", "hammer", "saw"]) {
        "Tools"
    } else if has(&["ore", "lump"]) {
        "Ores"
    } else if has(&["clay", "pottery"]) {
        "Clay"
    } else {
        "Other"
    }
}

/// A ranked suggestion for an item name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub item: String,
    pub score: u32,
    /// Number of corpus entries carrying this name.
    pub volume: usize,
    /// Mean unit price in copper across those entries.
    pub avg_price: f64,
    pub category: &'static str,
}

struct NameStats {
    volume: usize,
    price_sum: i64,
}

fn name_stats(corpus: &[QueryableItem]) -> HashMap<&str, NameStats> {
    let mut stats: HashMap<&str, NameStats> = HashMap::new();
    for item in corpus {
        let entry = stats.entry(item.name.as_str()).or_insert(NameStats {
            volume: 0,
            price_sum: 0,
        });
        entry.volume += 1;
        entry.price_sum += item.price;
    }
    stats
}

/// Rank distinct item names in `corpus` against `query`.
///
/// Sorted by score (desc), then volume (desc), then name for determinism,
/// and truncated to `limit`.
pub fn suggest(
    query: &str,
    corpus: &[QueryableItem],
    limit: usize,
    min_score: u32,
) -> Vec<Suggestion> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut results: Vec<Suggestion> = name_stats(corpus)
        .into_iter()
        .filter_map(|(name, stats)| {
            let score = fuzzy_score(query, name);
            if score < min_score {
                return None;
            }
            Some(Suggestion {
                item: name.to_string(),
                score,
                volume: stats.volume,
                avg_price: stats.price_sum as f64 / stats.volume as f64,
                category: categorize_item(name),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.volume.cmp(&a.volume))
            .then(a.item.cmp(&b.item))
    });
    results.truncate(limit);
    results
}

/// Most frequent item names, by volume.
pub fn popular_items(corpus: &[QueryableItem], limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = name_stats(corpus)
        .into_iter()
        .map(|(name, s)| (name.to_string(), s.volume))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<QueryableItem> {
        let mut items = Vec::new();
        for (i, (name, price)) in [
            ("stone brick", 10),
            ("stone brick", 20),
            ("stone shards", 5),
            ("iron lump", 100),
            ("brick oven", 900),
        ]
        .iter()
        .enumerate()
        {
            let mut it = QueryableItem::named(i.to_string(), *name);
            it.price = *price;
            items.push(it);
        }
        items
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
    }

    #[test]
    fn score_tiers() {
        assert_eq!(fuzzy_score("Iron Lump", "iron lump"), 100);
        assert_eq!(fuzzy_score("iron", "iron lump"), 95);
        assert_eq!(fuzzy_score("lump", "iron lump"), 90);
    }

    #[test]
    fn typo_scores_by_similarity() {
        // one edit over 9 chars: round(8/9 * 70) = 62
        assert_eq!(fuzzy_score("iron lumb", "iron lump"), 62);
    }

    #[test]
    fn missing_letters_score_by_similarity() {
        // two inserts over 11 chars: round(9/11 * 70) = 57
        assert_eq!(fuzzy_score("sto brick", "stone brick"), 57);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(fuzzy_score("zzzz", "iron lump") < MIN_SCORE);
        assert!(fuzzy_score("qwerty", "stone brick") < MIN_SCORE);
    }

    #[test]
    fn suggest_ranks_by_score_then_volume() {
        let results = suggest("stone", &corpus(), 10, MIN_SCORE);
        assert_eq!(results[0].item, "stone brick");
        assert_eq!(results[0].score, 95);
        assert_eq!(results[0].volume, 2);
        assert!((results[0].avg_price - 15.0).abs() < 1e-9);
        assert_eq!(results[1].item, "stone shards");
        assert_eq!(results[0].category, "Bricks");
        assert!(results.iter().all(|s| s.item != "iron lump"));
    }

    #[test]
    fn suggest_respects_limit_and_blank_query() {
        assert_eq!(suggest("brick", &corpus(), 1, MIN_SCORE).len(), 1);
        assert!(suggest("  ", &corpus(), 10, MIN_SCORE).is_empty());
        assert!(suggest("zzzzzz", &corpus(), 10, MIN_SCORE).is_empty());
    }

    #[test]
    fn popular_items_by_volume() {
        let top = popular_items(&corpus(), 2);
        assert_eq!(top[0], ("stone brick".to_string(), 2));
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn categories() {
        assert_eq!(categorize_item("Oak Planks"), "Wood");
        assert_eq!(categorize_item("iron lump"), "Metals");
        assert_eq!(categorize_item("copper ore"), "Ores");
        assert_eq!(categorize_item("bread"), "Other");
    }
}
