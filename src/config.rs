use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Extra attempts per failed chunk. 0 keeps one attempt per chunk.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_batch_size() -> usize {
    500
}
fn default_retry_backoff_ms() -> u64 {
    200
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.log".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_final_limit")]
    pub final_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            final_limit: default_final_limit(),
        }
    }
}

fn default_final_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct SuggestConfig {
    #[serde(default = "default_suggest_limit")]
    pub limit: usize,
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            limit: default_suggest_limit(),
            min_score: default_min_score(),
        }
    }
}

fn default_suggest_limit() -> usize {
    10
}
fn default_min_score() -> u32 {
    trade_harness_core::fuzzy::MIN_SCORE
}

impl Config {
    /// Defaults for commands that work on files only and never open the
    /// database.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/trades.sqlite"),
            },
            ingest: IngestConfig::default(),
            search: SearchConfig::default(),
            suggest: SuggestConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.ingest.batch_size == 0 {
        anyhow::bail!("ingest.batch_size must be > 0");
    }

    if config.search.final_limit < 1 {
        anyhow::bail!("search.final_limit must be >= 1");
    }

    if config.suggest.min_score > 100 {
        anyhow::bail!("suggest.min_score must be in [0, 100]");
    }

    Ok(config)
}

/// Like [`load_config`], but a config file that does not exist yields
/// [`Config::minimal`]. A file that exists must still parse and validate.
pub fn load_config_or_minimal(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::minimal());
    }
    load_config(path)
}
