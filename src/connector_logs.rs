//! Trade log discovery.
//!
//! `trade ingest logs` takes either a single file, which is used as given,
//! or a directory, which is walked recursively. Directory entries are kept
//! when their path relative to the root matches an include glob and no
//! exclude glob. Files are returned in sorted order so repeated runs submit
//! records in the same sequence.
//!
//! Each file is read whole into memory before parsing.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::IngestConfig;

pub fn discover_log_files(path: &Path, config: &IngestConfig) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("Log path does not exist: {}", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(path).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file = entry.path();
        let relative = file.strip_prefix(path).unwrap_or(file);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(file.to_path_buf());
    }

    files.sort();
    tracing::debug!(root = %path.display(), count = files.len(), "log files discovered");
    Ok(files)
}

/// Read a whole log file. Invalid UTF-8 is replaced rather than rejected.
pub fn read_log_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
