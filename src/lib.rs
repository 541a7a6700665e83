//! # Trade Harness
//!
//! A local-first ingestion and search tool for in-game trade chat logs.
//!
//! Trade Harness reads raw trade-channel logs (or pre-cleaned NDJSON
//! exports), turns every trade line into a canonical, fingerprinted record,
//! and stores it in SQLite with content-addressed deduplication. Stored
//! trades, or exported trade files, can then be searched with free text plus
//! structured filters, and item names can be fuzzy-matched for suggestions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │  Log files  │──▶│ Grammar +    │──▶│  Batch     │──▶│  SQLite  │
//! │  / NDJSON   │   │ Canonicalize │   │  Ingestor  │   │trade_logs│
//! └─────────────┘   └──────────────┘   └────────────┘   └────┬─────┘
//!                                                            │
//!                         ┌──────────────────────────────────┘
//!                         ▼
//!                  ┌──────────────┐
//!                  │SearchSession │  index + query DSL + fuzzy
//!                  │   (trade)    │
//!                  └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! trade init                                  # create database
//! trade ingest logs ./logs --date 2025-12-01  # ingest raw trade logs
//! trade ingest bulk ./export.ndjson           # ingest a pre-cleaned export
//! trade search "stone brick ql>90 price<50"
//! trade suggest "ston"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`connector_logs`] | Log file discovery |
//! | [`ingest`] | Chunked, fault-isolated submission |
//! | [`sqlite_store`] | SQLite `TradeStore` |
//! | [`search`] | Corpus loading and structured search |
//! | [`suggest`] | Fuzzy item suggestions |
//! | [`stats`] | Database overview |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//!
//! Parsing, canonicalization, the index and the query DSL live in the
//! runtime-free `trade-harness-core` crate.

pub mod config;
pub mod connector_logs;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod progress;
pub mod search;
pub mod sqlite_store;
pub mod stats;
pub mod suggest;
