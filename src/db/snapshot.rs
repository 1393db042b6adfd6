//! JSON snapshot files: one array per PostgREST endpoint, named after it
//! (`markets.json`, `market_scores.json`, ...).

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::db::SnapshotWriter;
use crate::error::Result;
use crate::types::{Category, DailyProbability, Market, MarketScore, Platform, Question};

/// Read `<dir>/<name>.json` as an array of `T`. A missing file is `Ok(None)`.
pub fn read_snapshot_file<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Option<Vec<T>>> {
    let path = dir.join(format!("{name}.json"));
    if !path.exists() {
        warn!(file = %path.display(), "snapshot file missing, skipping");
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    let rows: Vec<T> = serde_json::from_str(&raw)?;
    info!(file = %path.display(), rows = rows.len(), "snapshot file read");
    Ok(Some(rows))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub platforms: usize,
    pub categories: usize,
    pub questions: usize,
    pub markets: usize,
    pub market_scores: usize,
    pub daily_probabilities: usize,
}

/// Load every snapshot file present in `dir` into the database behind `writer`.
pub async fn import_dir(dir: &Path, writer: &SnapshotWriter) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    if let Some(rows) = read_snapshot_file::<Platform>(dir, "platforms")? {
        stats.platforms = writer.write_platforms(&rows).await?;
    }
    if let Some(rows) = read_snapshot_file::<Category>(dir, "categories")? {
        stats.categories = writer.write_categories(&rows).await?;
    }
    if let Some(rows) = read_snapshot_file::<Question>(dir, "questions")? {
        stats.questions = writer.write_questions(&rows).await?;
    }
    if let Some(rows) = read_snapshot_file::<Market>(dir, "markets")? {
        stats.markets = writer.write_markets(&rows).await?;
    }
    if let Some(rows) = read_snapshot_file::<MarketScore>(dir, "market_scores")? {
        stats.market_scores = writer.write_market_scores(&rows).await?;
    }
    if let Some(rows) = read_snapshot_file::<DailyProbability>(dir, "daily_probabilities")? {
        stats.daily_probabilities = writer.write_daily_probabilities(&rows).await?;
    }

    Ok(stats)
}
