//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow: log files → line grammar → canonical records
//! → chunked submission to a [`TradeStore`]. NDJSON bulk exports take the
//! same submission path after their own parse step.
//!
//! # Accounting
//!
//! | Outcome | Counter |
//! |---------|---------|
//! | chunk stored, row inserted | `success` |
//! | chunk stored, row already present | `duplicates` |
//! | chunk failed (after retries) | `errors += chunk size` |
//!
//! A failed chunk never aborts the chunks after it. Progress is reported
//! once per attempted chunk, in submission order. Cancellation is checked
//! between chunks, so a chunk that has started is always fully accounted.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use trade_harness_core::bulk::parse_bulk_bytes;
use trade_harness_core::canonical::{process_log_text, LogStats};
use trade_harness_core::models::CanonicalRecord;
use trade_harness_core::store::TradeStore;

use crate::config::{Config, IngestConfig};
use crate::connector_logs;
use crate::db;
use crate::migrate;
use crate::progress::{IngestProgressEvent, IngestProgressReporter};
use crate::sqlite_store::SqliteTradeStore;

/// Chunking and retry knobs for a [`BatchIngestor`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub batch_size: usize,
    /// Extra attempts for a failed chunk. 0 means a single attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub retry_backoff: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_retries: 0,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

impl IngestOptions {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Counters for one submission run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub success: u64,
    pub duplicates: u64,
    pub errors: u64,
    /// Records dropped before submission for lacking a trade type.
    pub skipped: u64,
    /// The run stopped early; unsubmitted chunks are in no counter.
    pub cancelled: bool,
}

/// Counters for one bulk file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub total_lines: u64,
    pub parse_errors: u64,
    pub synthetic_hashes: u64,
    #[serde(flatten)]
    pub submission: IngestSummary,
}

/// Splits records into chunks and submits them one at a time.
pub struct BatchIngestor<'a, S: TradeStore + ?Sized> {
    store: &'a S,
    options: IngestOptions,
    cancel: CancellationToken,
}

impl<'a, S: TradeStore + ?Sized> BatchIngestor<'a, S> {
    pub fn new(store: &'a S, options: IngestOptions) -> Self {
        Self {
            store,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between chunks once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Submit canonical records, dropping any without a trade type.
    ///
    /// `on_progress(processed, total)` runs after every attempted chunk.
    pub async fn submit_records<F>(
        &self,
        records: Vec<CanonicalRecord>,
        mut on_progress: F,
    ) -> IngestSummary
    where
        F: FnMut(u64, u64),
    {
        let mut summary = IngestSummary::default();

        let before = records.len();
        let valid: Vec<CanonicalRecord> = records
            .into_iter()
            .filter(|r| r.trade_type.is_some())
            .collect();
        summary.skipped = (before - valid.len()) as u64;

        let total = valid.len() as u64;
        let batch_size = self.options.batch_size.max(1);
        let mut processed = 0u64;

        for (i, chunk) in valid.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!(processed, total, "ingest cancelled between chunks");
                summary.cancelled = true;
                break;
            }

            match self.insert_with_retry(chunk).await {
                Ok(inserted) => {
                    let inserted = inserted.len() as u64;
                    summary.success += inserted;
                    summary.duplicates += (chunk.len() as u64).saturating_sub(inserted);
                    tracing::debug!(chunk = i, inserted, size = chunk.len(), "chunk stored");
                }
                Err(e) => {
                    tracing::warn!(chunk = i, size = chunk.len(), error = %e, "chunk failed");
                    summary.errors += chunk.len() as u64;
                }
            }

            processed += chunk.len() as u64;
            on_progress(processed, total);
        }

        summary
    }

    /// Parse raw NDJSON file contents and submit its records.
    ///
    /// Lines are decoded one at a time, so a stray non-UTF-8 byte costs one
    /// parse error rather than the file.
    pub async fn submit_bulk<F>(&self, bytes: &[u8], on_progress: F) -> BulkSummary
    where
        F: FnMut(u64, u64),
    {
        let parsed = parse_bulk_bytes(bytes);
        let mut submission = self.submit_records(parsed.records, on_progress).await;
        submission.skipped += parsed.untyped as u64;

        BulkSummary {
            total_lines: parsed.total_lines as u64,
            parse_errors: parsed.parse_errors as u64,
            synthetic_hashes: parsed.synthetic_hashes as u64,
            submission,
        }
    }

    async fn insert_with_retry(&self, chunk: &[CanonicalRecord]) -> Result<Vec<CanonicalRecord>> {
        let mut attempt = 0u32;
        loop {
            match self.store.insert_ignore_conflicts(chunk).await {
                Ok(inserted) => return Ok(inserted),
                Err(e) if attempt < self.options.max_retries => {
                    let delay = self.options.retry_backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::debug!(attempt, ?delay, error = %e, "retrying chunk");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Cancel `token` on Ctrl-C. Abort the returned handle once the run ends.
fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current chunk");
            token.cancel();
        }
    })
}

async fn open_store(config: &Config) -> Result<SqliteTradeStore> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    Ok(SqliteTradeStore::new(pool))
}

fn print_submission(summary: &IngestSummary) {
    println!("  success: {}", summary.success);
    println!("  duplicates: {}", summary.duplicates);
    println!("  errors: {}", summary.errors);
    if summary.cancelled {
        println!("cancelled");
    } else {
        println!("ok");
    }
}

/// `trade ingest logs <path>`: a log file, or a directory of them.
pub async fn run_ingest_logs(
    config: &Config,
    path: &Path,
    date: Option<NaiveDate>,
    dry_run: bool,
    progress: &dyn IngestProgressReporter,
) -> Result<()> {
    let processing_date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let files = connector_logs::discover_log_files(path, &config.ingest)?;
    let source = path.display().to_string();

    let mut stats = LogStats::default();
    let mut records = Vec::new();
    for file in &files {
        progress.report(IngestProgressEvent::Reading {
            source: file.display().to_string(),
        });
        let text = connector_logs::read_log_file(file)?;
        let batch = process_log_text(&text, processing_date);
        tracing::info!(
            file = %file.display(),
            total = batch.stats.total,
            valid = batch.stats.valid,
            ignored = batch.stats.ignored,
            "log file processed"
        );
        stats.total += batch.stats.total;
        stats.valid += batch.stats.valid;
        stats.ignored += batch.stats.ignored;
        records.extend(batch.records);
    }

    if dry_run {
        println!("ingest logs {} (dry-run)", source);
        println!("  files: {}", files.len());
        println!("  lines: {}", stats.total);
        println!("  valid: {}", stats.valid);
        println!("  ignored: {}", stats.ignored);
        return Ok(());
    }

    let store = open_store(config).await?;
    let cancel = CancellationToken::new();
    let signal = cancel_on_ctrl_c(cancel.clone());

    let ingestor = BatchIngestor::new(&store, IngestOptions::from_config(&config.ingest))
        .with_cancellation(cancel);
    let summary = ingestor
        .submit_records(records, |n, total| {
            progress.report(IngestProgressEvent::Submitting {
                source: source.clone(),
                n,
                total,
            })
        })
        .await;
    signal.abort();

    println!("ingest logs {}", source);
    println!("  files: {}", files.len());
    println!("  lines: {}", stats.total);
    println!("  valid: {}", stats.valid);
    println!("  ignored: {}", stats.ignored);
    print_submission(&summary);

    store.pool().close().await;
    Ok(())
}

/// `trade ingest bulk <file>`: a pre-cleaned NDJSON export.
pub async fn run_ingest_bulk(
    config: &Config,
    path: &Path,
    progress: &dyn IngestProgressReporter,
) -> Result<()> {
    let source = path.display().to_string();
    progress.report(IngestProgressEvent::Reading {
        source: source.clone(),
    });
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read bulk file: {}", path.display()))?;

    let store = open_store(config).await?;
    let cancel = CancellationToken::new();
    let signal = cancel_on_ctrl_c(cancel.clone());

    let ingestor = BatchIngestor::new(&store, IngestOptions::from_config(&config.ingest))
        .with_cancellation(cancel);
    let summary = ingestor
        .submit_bulk(&bytes, |n, total| {
            progress.report(IngestProgressEvent::Submitting {
                source: source.clone(),
                n,
                total,
            })
        })
        .await;
    signal.abort();

    println!("ingest bulk {}", source);
    println!("  total lines: {}", summary.total_lines);
    println!("  parse errors: {}", summary.parse_errors);
    println!("  skipped (no trade type): {}", summary.submission.skipped);
    println!("  synthetic hashes: {}", summary.synthetic_hashes);
    print_submission(&summary.submission);

    store.pool().close().await;
    Ok(())
}
