//! Historical parlay backtesting.
//!
//! `run_backtest` is the single orchestration entry point: load the ledger,
//! simulate every leg-count strategy, and summarize. Exporting is left to
//! the caller so nothing is written until the summary exists.

pub mod calibration;
pub mod runner;
pub mod stats;

use tracing::{error, info};

use crate::config::AppConfig;
use crate::data::{GameLedger, LoadReport};
use crate::oracle::PredictionOracle;
use crate::types::BacktestError;

pub use calibration::{CalibrationDiagnosis, CalibrationReport, Calibrator};
pub use runner::{BacktestRun, BacktestSettings, Backtester, StrategyRun};
pub use stats::{summarize, BacktestSummary, BreakevenRow, Zone, ZonePolicy};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub run: BacktestRun,
    pub summary: BacktestSummary,
    pub load_reports: Vec<LoadReport>,
}

/// Simulate an already-loaded ledger. Fails only when the ledger is empty.
pub fn run_on_ledger(
    ledger: &GameLedger,
    settings: BacktestSettings,
    zones: &ZonePolicy,
    oracle: Box<dyn PredictionOracle>,
) -> Result<(BacktestRun, BacktestSummary), BacktestError> {
    if ledger.is_empty() {
        error!("No games loaded from any source; aborting before simulation");
        return Err(BacktestError::NoData);
    }

    let run = Backtester::new(settings, oracle).run(ledger);
    let summary = summarize(&run, zones);
    Ok((run, summary))
}

/// Load -> simulate -> summarize, driven by the application config.
pub fn run_backtest(
    cfg: &AppConfig,
    oracle: Box<dyn PredictionOracle>,
) -> Result<BacktestOutcome, BacktestError> {
    let ledger = GameLedger::load(&cfg.active_sources());
    let zones = ZonePolicy::new(cfg.zones.optimal_max_legs);
    let (run, summary) = run_on_ledger(&ledger, BacktestSettings::from(cfg), &zones, oracle)?;

    info!(
        days = summary.metadata.days_simulated,
        strategies = summary.strategies.len(),
        "Backtest summarized"
    );

    Ok(BacktestOutcome {
        run,
        summary,
        load_reports: ledger.reports().to_vec(),
    })
}
