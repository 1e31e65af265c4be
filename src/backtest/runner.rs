//! Historical parlay simulator.
//!
//! Walks the ledger one date at a time, asks the oracle for a pick on every
//! game of the enabled sports, ranks those picks once, and lets each tested
//! leg count build its parlay from the same ranking. Bankrolls and stats are
//! kept per leg count and never interact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::data::GameLedger;
use crate::oracle::{day_rng, PredictionOracle};
use crate::strategy::{settle, RankedSlate};
use crate::types::{ParlayLeg, ParlayResult, Sport, StrategyStats};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Knobs for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// Sports to draw legs from, in encounter order.
    pub sports: Vec<Sport>,
    /// Ascending, deduplicated.
    pub leg_counts: Vec<usize>,
    pub max_days: Option<usize>,
    pub initial_bankroll: f64,
    pub bet_amount: f64,
    pub seed: u64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            sports: Sport::ALL.to_vec(),
            leg_counts: vec![2, 3, 4, 5, 6],
            max_days: None,
            initial_bankroll: 10_000.0,
            bet_amount: 100.0,
            seed: 42,
        }
    }
}

impl From<&AppConfig> for BacktestSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            sports: cfg.active_sports(),
            leg_counts: cfg.backtest.leg_counts_to_test.clone(),
            max_days: cfg.backtest.max_days,
            initial_bankroll: cfg.backtest.initial_bankroll,
            bet_amount: cfg.backtest.bet_amount,
            seed: cfg.backtest.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

/// Complete history of one leg-count strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub stats: StrategyStats,
    /// Chronological; one entry per date that had enough legs.
    pub results: Vec<ParlayResult>,
    pub final_bankroll: f64,
}

impl StrategyRun {
    fn new(leg_count: usize, initial_bankroll: f64) -> Self {
        Self {
            stats: StrategyStats::new(leg_count),
            results: Vec::new(),
            final_bankroll: initial_bankroll,
        }
    }

    pub fn leg_count(&self) -> usize {
        self.stats.leg_count
    }

    /// Settle one day's parlay and append it to the history.
    fn apply(&mut self, date: NaiveDate, legs: &[ParlayLeg], bet_amount: f64) {
        let settlement = settle(legs, bet_amount);
        self.final_bankroll += settlement.profit_loss;
        self.stats
            .record(settlement.won, bet_amount, settlement.profit_loss);

        let mut sports_used: Vec<Sport> = Vec::new();
        for leg in legs {
            if !sports_used.contains(&leg.sport) {
                sports_used.push(leg.sport);
            }
        }

        self.results.push(ParlayResult {
            date,
            leg_count: legs.len(),
            legs: legs.to_vec(),
            parlay_won: settlement.won,
            bet_amount,
            payout: settlement.payout,
            profit_loss: settlement.profit_loss,
            bankroll_after: self.final_bankroll,
            sports_used,
        });
    }
}

/// Everything a finished simulation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub settings: BacktestSettings,
    pub oracle: String,
    /// One per tested leg count, ascending.
    pub strategies: Vec<StrategyRun>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub days_simulated: usize,
    /// Oracle calls made (one per game per simulated day).
    pub legs_generated: usize,
}

impl BacktestRun {
    pub fn strategy(&self, leg_count: usize) -> Option<&StrategyRun> {
        self.strategies.iter().find(|s| s.leg_count() == leg_count)
    }

    /// Every parlay across all strategies.
    pub fn all_results(&self) -> impl Iterator<Item = &ParlayResult> {
        self.strategies.iter().flat_map(|s| s.results.iter())
    }
}

// ---------------------------------------------------------------------------
// Backtester
// ---------------------------------------------------------------------------

pub struct Backtester {
    settings: BacktestSettings,
    oracle: Box<dyn PredictionOracle>,
}

impl Backtester {
    pub fn new(settings: BacktestSettings, oracle: Box<dyn PredictionOracle>) -> Self {
        let mut settings = settings;
        settings.leg_counts.sort_unstable();
        settings.leg_counts.dedup();
        settings.leg_counts.retain(|&l| l > 0);
        Self { settings, oracle }
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    /// Dates the run will cover: ascending, only those with at least one
    /// game in an enabled sport, capped at `max_days`.
    pub fn simulation_dates(&self, ledger: &GameLedger) -> Vec<NaiveDate> {
        let dates = ledger.dates().filter(|&date| {
            self.settings
                .sports
                .iter()
                .any(|&sport| !ledger.games_on(date, sport).is_empty())
        });
        match self.settings.max_days {
            Some(max) => dates.take(max).collect(),
            None => dates.collect(),
        }
    }

    /// Ask the oracle about every game on `date` and rank the picks.
    ///
    /// Encounter order is sport order from the settings, then file order.
    pub fn build_slate(&self, ledger: &GameLedger, date: NaiveDate) -> RankedSlate {
        let mut rng = day_rng(self.settings.seed, date);
        let legs: Vec<ParlayLeg> = self
            .settings
            .sports
            .iter()
            .flat_map(|&sport| ledger.games_on(date, sport))
            .map(|game| self.oracle.predict(game, &mut rng))
            .collect();
        RankedSlate::build(legs)
    }

    /// Run the full simulation. Dates are processed strictly in order and
    /// every outcome is final once computed.
    pub fn run(&self, ledger: &GameLedger) -> BacktestRun {
        let dates = self.simulation_dates(ledger);
        info!(
            days = dates.len(),
            leg_counts = ?self.settings.leg_counts,
            sports = ?self.settings.sports,
            seed = self.settings.seed,
            oracle = self.oracle.name(),
            "Starting parlay backtest"
        );

        let mut strategies: Vec<StrategyRun> = self
            .settings
            .leg_counts
            .iter()
            .map(|&l| StrategyRun::new(l, self.settings.initial_bankroll))
            .collect();
        let mut legs_generated = 0usize;

        for &date in &dates {
            let slate = self.build_slate(ledger, date);
            legs_generated += slate.len();

            let mut formed = 0usize;
            for strategy in strategies.iter_mut() {
                if let Some(legs) = slate.select(strategy.leg_count()) {
                    strategy.apply(date, legs, self.settings.bet_amount);
                    formed += 1;
                }
            }
            debug!(%date, candidates = slate.len(), parlays = formed, "Day simulated");
        }

        for s in &strategies {
            info!(
                legs = s.leg_count(),
                parlays = s.stats.total_parlays,
                wins = s.stats.wins,
                win_rate = format!("{:.2}%", s.stats.win_rate()),
                roi = format!("{:.2}%", s.stats.roi()),
                bankroll = format!("${:.2}", s.final_bankroll),
                "Strategy complete"
            );
        }

        BacktestRun {
            settings: self.settings.clone(),
            oracle: self.oracle.name().to_string(),
            strategies,
            first_date: dates.first().copied(),
            last_date: dates.last().copied(),
            days_simulated: dates.len(),
            legs_generated,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
