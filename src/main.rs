//! # Trade Harness CLI (`trade`)
//!
//! The `trade` binary is the primary interface for Trade Harness. It provides
//! commands for database initialization, trade-log ingestion, search,
//! suggestions, and database statistics.
//!
//! ## Usage
//!
//! ```bash
//! trade --config ./config/trade.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `trade init` | Create the SQLite database and run schema migrations |
//! | `trade ingest logs <path>` | Ingest raw trade-channel logs (file or directory) |
//! | `trade ingest bulk <file>` | Ingest a pre-cleaned NDJSON export |
//! | `trade search "<query>"` | Search trades with free text and filters |
//! | `trade suggest "<query>"` | Fuzzy item-name suggestions |
//! | `trade stats` | Show what has been ingested |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! trade init --config ./config/trade.toml
//!
//! # Ingest one day of logs
//! trade ingest logs ./logs/Trade.2025-12-01.txt --date 2025-12-01
//!
//! # Filtered search over a trade export, without touching the database
//! trade search "brick ql>=80 price<=500 type=wts" --file ./market.json
//! ```

use trade_harness::{config, ingest, logging, migrate, progress, search, stats, suggest};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trade Harness CLI: ingest and search in-game trade chat logs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/trade.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "trade",
    about = "Trade Harness: ingest and search in-game trade chat logs",
    version,
    long_about = "Trade Harness parses raw trade-channel logs into canonical, deduplicated \
    trade records stored in SQLite, and searches them with free text, structured filters \
    (ql>90 price<50 seller=name) and fuzzy item suggestions."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/trade.toml`. `search` and `suggest` with
    /// `--file` fall back to built-in defaults when the file does not exist.
    #[arg(long, global = true, default_value = "./config/trade.toml")]
    config: PathBuf,

    /// Progress reporting on stderr.
    #[arg(long, global = true, value_enum, default_value = "auto")]
    progress: progress::ProgressMode,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `trade_logs` table.
    /// Running it more than once is safe.
    Init,

    /// Ingest trade data into the database.
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Search trades.
    ///
    /// The query mixes free text with `<field><op><value>` filters, e.g.
    /// `stone ql>90 price<50 seller=jota`. Fields: ql, price, qty, seller,
    /// rarity, material, type. Operators: >=, <=, >, <, =.
    Search {
        /// The search query string. Empty matches everything.
        query: String,

        /// Search a trade file (JSON array or NDJSON) instead of the database.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Suggest item names that fuzzy-match a query.
    ///
    /// An empty query lists the most traded items.
    Suggest {
        query: String,

        /// Use a trade file (JSON array or NDJSON) instead of the database.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Maximum number of suggestions.
        #[arg(long)]
        limit: Option<usize>,

        /// Print suggestions as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show database statistics.
    Stats,
}

/// Ingest sources.
#[derive(Subcommand)]
enum IngestSource {
    /// Raw trade-channel logs: `[HH:MM:SS] <Nick> (Server) Message`.
    ///
    /// PATH is a log file or a directory walked with the configured globs.
    Logs {
        path: PathBuf,

        /// Calendar date the log lines belong to (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Parse and count lines without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// A pre-cleaned NDJSON export, one trade object per line.
    Bulk { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let reporter = cli.progress.reporter();

    // File-backed lookups don't need a config file
    match &cli.command {
        Commands::Search {
            query,
            file: Some(file),
            limit,
            json,
        } => {
            let cfg = config::load_config_or_minimal(&cli.config)?;
            search::run_search(&cfg, query, Some(file.as_path()), *limit, *json).await?;
            return Ok(());
        }
        Commands::Suggest {
            query,
            file: Some(file),
            limit,
            json,
        } => {
            let cfg = config::load_config_or_minimal(&cli.config)?;
            suggest::run_suggest(&cfg, query, Some(file.as_path()), *limit, *json).await?;
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { source } => match source {
            IngestSource::Logs {
                path,
                date,
                dry_run,
            } => {
                ingest::run_ingest_logs(&cfg, &path, date, dry_run, reporter.as_ref()).await?;
            }
            IngestSource::Bulk { file } => {
                ingest::run_ingest_bulk(&cfg, &file, reporter.as_ref()).await?;
            }
        },
        Commands::Search {
            query,
            file,
            limit,
            json,
        } => {
            search::run_search(&cfg, &query, file.as_deref(), limit, json).await?;
        }
        Commands::Suggest {
            query,
            file,
            limit,
            json,
        } => {
            suggest::run_suggest(&cfg, &query, file.as_deref(), limit, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
