//! Substring-tolerant inverted index over [`QueryableItem`]s.
//!
//! # Build
//!
//! Each item contributes one searchable string: name, seller, material,
//! order type and rarity, lowercased, with `"Unknown"` and empty fields left
//! out. The string is split on whitespace and every distinct token of at
//! least [`MIN_TOKEN_LEN`] characters maps to the item's position.
//!
//! # Query
//!
//! Query terms are ANDed. A term matches every indexed token that
//! *contains* it, so `bri` finds `brick` and `fabric`. Finding those tokens
//! means scanning the whole vocabulary, so one term costs
//! `O(V · L)` for `V` distinct tokens of average length `L`, plus the size
//! of the postings it unions. Term results are intersected smallest first.
//! Results come back in corpus order, not ranked.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::{QueryableItem, UNKNOWN};

/// Tokens shorter than this are not indexed.
pub const MIN_TOKEN_LEN: usize = 2;

/// Token → positions of the items containing it.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, BTreeSet<usize>>,
    len: usize,
}

/// Size figures for an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_items: usize,
    pub unique_tokens: usize,
}

/// The lowercased text an item is indexed under.
pub fn searchable_text(item: &QueryableItem) -> String {
    [
        item.name.as_str(),
        item.seller.as_str(),
        item.material.as_str(),
        item.order_type.as_str(),
        item.rarity.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty() && **part != UNKNOWN)
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

impl InvertedIndex {
    /// Build a fresh index over `items`. Positions are slice indices.
    pub fn build(items: &[QueryableItem]) -> Self {
        let mut postings: HashMap<String, BTreeSet<usize>> = HashMap::new();

        for (pos, item) in items.iter().enumerate() {
            let text = searchable_text(item);
            for token in text.split_whitespace() {
                if token.chars().count() < MIN_TOKEN_LEN {
                    continue;
                }
                postings.entry(token.to_string()).or_default().insert(pos);
            }
        }

        Self {
            postings,
            len: items.len(),
        }
    }

    /// Number of items the index was built over.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_items: self.len,
            unique_tokens: self.postings.len(),
        }
    }

    /// Positions matching every whitespace-separated term of `query`.
    ///
    /// A blank query matches every position.
    pub fn query(&self, query: &str) -> Vec<usize> {
        let lowered = query.to_lowercase();
        let terms: Vec<&str> = lowered.split_whitespace().collect();
        if terms.is_empty() {
            return (0..self.len).collect();
        }

        let mut term_sets: Vec<BTreeSet<usize>> = Vec::with_capacity(terms.len());
        for term in terms {
            let matches = self.positions_for_term(term);
            if matches.is_empty() {
                return Vec::new();
            }
            term_sets.push(matches);
        }

        term_sets.sort_by_key(|s| s.len());
        let mut sets = term_sets.into_iter();
        let Some(mut acc) = sets.next() else {
            return Vec::new();
        };
        for set in sets {
            acc.retain(|pos| set.contains(pos));
            if acc.is_empty() {
                return Vec::new();
            }
        }

        acc.into_iter().collect()
    }

    /// Union of postings for every token containing `term`.
    fn positions_for_term(&self, term: &str) -> BTreeSet<usize> {
        let mut matches = BTreeSet::new();
        for (token, positions) in &self.postings {
            if token.contains(term) {
                matches.extend(positions.iter().copied());
            }
        }
        matches
    }
}
