//! Search sessions over an in-memory corpus.
//!
//! A [`SearchSession`] owns one corpus snapshot and the inverted index built
//! from it. Loading a new corpus builds a new index first and then replaces
//! both together, so a reader never sees an index that does not match its
//! corpus.
//!
//! # Query pipeline
//!
//! ```text
//! "stone ql>90 price<50"
//!     │
//!     ├── parse_query ──► text "stone", clauses [ql>90, price<50]
//!     ├── index.query("stone") ──► candidate positions
//!     └── clause predicates (AND) ──► results, corpus order
//! ```

use serde::Serialize;

use crate::index::{IndexStats, InvertedIndex};
use crate::models::QueryableItem;
use crate::query::{matches_all, parse_query, ParsedQuery};

/// A corpus snapshot plus its index.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    items: Vec<QueryableItem>,
    index: InvertedIndex,
}

/// Results of a structured query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults<'a> {
    pub query: ParsedQuery,
    /// Matches before the limit was applied.
    pub total_matches: usize,
    pub items: Vec<&'a QueryableItem>,
}

impl SearchSession {
    pub fn new(items: Vec<QueryableItem>) -> Self {
        let index = InvertedIndex::build(&items);
        Self { items, index }
    }

    /// Replace the corpus, rebuilding the index from scratch.
    pub fn rebuild(&mut self, items: Vec<QueryableItem>) {
        *self = Self::new(items);
        tracing::debug!(
            items = self.index.len(),
            tokens = self.index.stats().unique_tokens,
            "search index rebuilt"
        );
    }

    pub fn items(&self) -> &[QueryableItem] {
        &self.items
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    /// Free-text search. A blank query returns the whole corpus.
    pub fn search(&self, text: &str) -> Vec<&QueryableItem> {
        self.index
            .query(text)
            .into_iter()
            .filter_map(|pos| self.items.get(pos))
            .collect()
    }

    /// Free text plus filter clauses, truncated to `limit`.
    pub fn query(&self, input: &str, limit: usize) -> SearchResults<'_> {
        let parsed = parse_query(input);
        let predicates = parsed.predicates();

        let matched: Vec<&QueryableItem> = self
            .search(&parsed.text_query)
            .into_iter()
            .filter(|item| matches_all(&predicates, item))
            .collect();

        let total_matches = matched.len();
        let items = matched.into_iter().take(limit).collect();
        SearchResults {
            query: parsed,
            total_matches,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<QueryableItem> {
        let specs = [
            ("stone brick", 40, 95.0, "jotasiete"),
            ("stone brick", 100, 80.0, "alice"),
            ("iron lump", 150, 91.0, "jota"),
            ("stone shards", 101, 99.0, "bob"),
        ];
        specs
            .iter()
            .enumerate()
            .map(|(i, (name, price, ql, seller))| {
                let mut it = QueryableItem::named(i.to_string(), *name);
                it.price = *price;
                it.quality = *ql;
                it.seller = seller.to_string();
                it.order_type = "WTS".to_string();
                it
            })
            .collect()
    }

    fn ids(items: &[&QueryableItem]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn blank_search_returns_everything() {
        let session = SearchSession::new(corpus());
        assert_eq!(session.search("").len(), 4);
        assert_eq!(session.query("", 50).total_matches, 4);
    }

    #[test]
    fn text_then_filters() {
        let session = SearchSession::new(corpus());
        let res = session.query("stone ql>90 price<50", 50);
        assert_eq!(res.query.text_query, "stone");
        assert_eq!(ids(&res.items), vec!["0"]);
    }

    #[test]
    fn filters_only() {
        let session = SearchSession::new(corpus());
        let res = session.query("price>100", 50);
        assert_eq!(ids(&res.items), vec!["2", "3"]);
        let res = session.query("seller=jota", 50);
        assert_eq!(ids(&res.items), vec!["0", "2"]);
    }

    #[test]
    fn limit_truncates_but_reports_total() {
        let session = SearchSession::new(corpus());
        let res = session.query("stone", 1);
        assert_eq!(res.total_matches, 3);
        assert_eq!(res.items.len(), 1);
    }

    #[test]
    fn rebuild_replaces_corpus_and_index() {
        let mut session = SearchSession::new(corpus());
        assert_eq!(session.search("iron").len(), 1);
        session.rebuild(vec![QueryableItem::named("x", "oak plank")]);
        assert!(session.search("iron").is_empty());
        assert_eq!(session.search("plank").len(), 1);
        assert_eq!(session.stats().total_items, 1);
    }
}
