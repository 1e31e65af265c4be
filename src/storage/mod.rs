//! Results export.
//!
//! Writes the backtest summary plus bounded parlay samples to a single
//! pretty-printed JSON file. The file is written to a sibling temp path
//! and renamed into place, so a failed write never leaves a partial
//! artifact behind.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backtest::{BacktestRun, BacktestSummary};
use crate::types::ParlayResult;

/// Bounds on the parlay samples included in an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLimits {
    pub max_winning: usize,
    pub max_recent: usize,
}

impl Default for SampleLimits {
    fn default() -> Self {
        Self {
            max_winning: 20,
            max_recent: 50,
        }
    }
}

/// The persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: BacktestSummary,
    /// Earliest winning parlays by date, leg count ascending within a day.
    pub winning_samples: Vec<ParlayResult>,
    /// Latest parlays across all strategies, oldest first.
    pub recent_results: Vec<ParlayResult>,
}

impl ExportBundle {
    pub fn new(summary: BacktestSummary, run: &BacktestRun, limits: SampleLimits) -> Self {
        // Chronological across strategies, leg count ascending within a day.
        let mut all: Vec<&ParlayResult> = run.all_results().collect();
        all.sort_by_key(|r| (r.date, r.leg_count));

        let winning_samples: Vec<ParlayResult> = all
            .iter()
            .copied()
            .filter(|r| r.parlay_won)
            .take(limits.max_winning)
            .cloned()
            .collect();

        let skip = all.len().saturating_sub(limits.max_recent);
        let recent_results = all.into_iter().skip(skip).cloned().collect();

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary,
            winning_samples,
            recent_results,
        }
    }
}

/// Write a bundle as JSON, creating parent directories as needed.
/// Returns the path written.
pub fn save_bundle(bundle: &ExportBundle, path: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(bundle).context("Failed to serialise backtest results")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let tmp = path.with_extension(format!("tmp-{}", bundle.run_id.simple()));
    std::fs::write(&tmp, &json)
        .with_context(|| format!("Failed to write results to {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to move results into {}", path.display()));
    }

    info!(
        path = %path.display(),
        run_id = %bundle.run_id,
        bytes = json.len(),
        "Backtest results exported"
    );
    Ok(path.to_path_buf())
}

/// Read a previously exported bundle.
pub fn load_bundle(path: &Path) -> Result<ExportBundle> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results from {}", path.display()))?;
    let bundle: ExportBundle = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse results from {}", path.display()))?;
    debug!(path = %path.display(), run_id = %bundle.run_id, "Results loaded");
    Ok(bundle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
