//! `trade suggest`: fuzzy item-name suggestions over a trade corpus.

use anyhow::Result;
use std::path::Path;

use trade_harness_core::fuzzy::{popular_items, suggest};

use crate::config::Config;
use crate::search::{format_copper, load_corpus};

/// Print ranked suggestions. An empty query lists the most traded items.
pub async fn run_suggest(
    config: &Config,
    query: &str,
    file: Option<&Path>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let limit = limit.unwrap_or(config.suggest.limit).max(1);
    let corpus = load_corpus(config, file).await?;

    if query.trim().is_empty() {
        let popular = popular_items(&corpus, limit);
        if json {
            println!("{}", serde_json::to_string_pretty(&popular)?);
            return Ok(());
        }
        if popular.is_empty() {
            println!("No items.");
        }
        for (i, (name, volume)) in popular.iter().enumerate() {
            println!("{}. {} ({} listings)", i + 1, name, volume);
        }
        return Ok(());
    }

    let suggestions = suggest(query, &corpus, limit, config.suggest.min_score);

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }

    println!(
        "  {:<4} {:<32} {:>5} {:>7} {:>12}   {}",
        "#", "ITEM", "SCORE", "VOLUME", "AVG PRICE", "CATEGORY"
    );
    println!("  {}", "-".repeat(76));
    for (i, s) in suggestions.iter().enumerate() {
        println!(
            "  {:<4} {:<32} {:>5} {:>7} {:>12}   {}",
            i + 1,
            s.item,
            s.score,
            s.volume,
            format_copper(s.avg_price.round() as i64),
            s.category
        );
    }

    Ok(())
}
