//! # Trade Harness Core
//!
//! Runtime-free logic for Trade Harness: the trade-log line grammar,
//! canonicalization rules, content fingerprints, the store abstraction,
//! the inverted index, the structured query DSL, and fuzzy matching.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Callers hand it
//! text and records; it hands back canonical values and search results.
//!
//! ## Pipeline
//!
//! ```text
//! raw line ──▶ grammar ──▶ canonical ──▶ fingerprint ──▶ TradeStore
//!
//! corpus ──▶ InvertedIndex ──┐
//!                            ├──▶ SearchSession::query
//! query  ──▶ parse_query ────┘
//! ```

pub mod bulk;
pub mod canonical;
pub mod corpus;
pub mod fingerprint;
pub mod fuzzy;
pub mod grammar;
pub mod index;
pub mod models;
pub mod price;
pub mod query;
pub mod search;
pub mod store;
