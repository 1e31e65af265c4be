//! Statistics aggregation.
//!
//! Pure functions over a finished [`BacktestRun`]: per-strategy
//! performance, optimal vs. aggressive zone comparison, break-even table,
//! sport usage and plain-language recommendations. Nothing here mutates
//! the run, so summarizing twice gives identical output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::calibration::{CalibrationReport, Calibrator};
use super::runner::{BacktestRun, StrategyRun};
use crate::strategy::payout_multiplier;
use crate::types::Sport;

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Optimal,
    Aggressive,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Optimal => write!(f, "optimal"),
            Zone::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Splits leg counts into the optimal and aggressive zones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZonePolicy {
    /// Largest leg count still in the optimal zone.
    pub optimal_max_legs: usize,
}

impl Default for ZonePolicy {
    fn default() -> Self {
        Self { optimal_max_legs: 3 }
    }
}

impl ZonePolicy {
    pub fn new(optimal_max_legs: usize) -> Self {
        Self { optimal_max_legs }
    }

    pub fn classify(&self, leg_count: usize) -> Zone {
        if leg_count <= self.optimal_max_legs {
            Zone::Optimal
        } else {
            Zone::Aggressive
        }
    }
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days_simulated: usize,
    pub sports: Vec<Sport>,
    pub leg_counts: Vec<usize>,
    pub initial_bankroll: f64,
    pub bet_amount: f64,
    pub seed: u64,
    pub oracle: String,
    pub legs_generated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    pub leg_count: usize,
    pub zone: Zone,
    pub payout_multiplier: f64,
    pub total_parlays: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_rate: f64,
    pub roi: f64,
    pub total_wagered: f64,
    pub total_profit: f64,
    pub final_bankroll: f64,
    pub best_day_profit: f64,
    pub worst_day_loss: f64,
    pub peak_bankroll: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub zone: Zone,
    pub leg_counts: Vec<usize>,
    pub total_parlays: u64,
    pub wins: u64,
    pub total_wagered: f64,
    pub total_profit: f64,
    /// From summed wins and parlays, not an average of strategy rates.
    pub win_rate: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneComparison {
    pub optimal_max_legs: usize,
    pub optimal: ZoneStats,
    pub aggressive: ZoneStats,
    /// Higher-ROI zone; `None` when either zone placed no parlays.
    pub better_zone: Option<Zone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakevenRow {
    pub leg_count: usize,
    pub payout_multiplier: f64,
    /// Percentage.
    pub breakeven_win_rate: f64,
    /// Per-leg hit rate needed to reach the break-even parlay rate.
    pub required_per_leg_accuracy: f64,
    pub actual_win_rate: f64,
    /// L-th root of the realized parlay win rate. Biased whenever legs in a
    /// parlay differ in difficulty; treat as an estimate, not a measurement.
    pub actual_per_leg_accuracy: f64,
    /// actual_win_rate - breakeven_win_rate, in percentage points.
    pub edge: f64,
    pub profitable: bool,
}

/// Everything the exporter writes besides the parlay samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub metadata: RunMetadata,
    pub strategies: Vec<StrategyPerformance>,
    pub zones: ZoneComparison,
    /// Legs used per sport across every parlay of every strategy.
    pub sport_usage: BTreeMap<Sport, u64>,
    pub breakeven: Vec<BreakevenRow>,
    pub calibration: CalibrationReport,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Percentage helper: 0 when the denominator is 0.
fn pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Break-even win rate (%) for an L-leg parlay.
pub fn breakeven_win_rate(leg_count: usize) -> f64 {
    100.0 / payout_multiplier(leg_count)
}

/// Convert a parlay win rate (%) into the implied per-leg hit rate (%).
pub fn per_leg_accuracy(parlay_win_rate: f64, leg_count: usize) -> f64 {
    if leg_count == 0 || parlay_win_rate <= 0.0 {
        return 0.0;
    }
    (parlay_win_rate / 100.0).powf(1.0 / leg_count as f64) * 100.0
}

pub fn breakeven_row(leg_count: usize, actual_win_rate: f64) -> BreakevenRow {
    let breakeven = breakeven_win_rate(leg_count);
    BreakevenRow {
        leg_count,
        payout_multiplier: payout_multiplier(leg_count),
        breakeven_win_rate: breakeven,
        required_per_leg_accuracy: per_leg_accuracy(breakeven, leg_count),
        actual_win_rate,
        actual_per_leg_accuracy: per_leg_accuracy(actual_win_rate, leg_count),
        edge: actual_win_rate - breakeven,
        profitable: actual_win_rate > breakeven,
    }
}

fn performance(strategy: &StrategyRun, initial_bankroll: f64, zones: &ZonePolicy) -> StrategyPerformance {
    let stats = &strategy.stats;

    let mut peak = initial_bankroll;
    let mut max_dd = 0.0_f64;
    let mut max_dd_pct = 0.0_f64;
    for r in &strategy.results {
        peak = peak.max(r.bankroll_after);
        let dd = peak - r.bankroll_after;
        if dd > max_dd {
            max_dd = dd;
            max_dd_pct = pct(dd, peak);
        }
    }

    StrategyPerformance {
        leg_count: stats.leg_count,
        zone: zones.classify(stats.leg_count),
        payout_multiplier: payout_multiplier(stats.leg_count),
        total_parlays: stats.total_parlays,
        wins: stats.wins,
        losses: stats.losses,
        win_rate: stats.win_rate(),
        roi: stats.roi(),
        total_wagered: stats.total_wagered,
        total_profit: stats.total_profit,
        final_bankroll: strategy.final_bankroll,
        best_day_profit: stats.best_day_profit,
        worst_day_loss: stats.worst_day_loss,
        peak_bankroll: peak,
        max_drawdown: max_dd,
        max_drawdown_pct: max_dd_pct,
    }
}

fn zone_stats(zone: Zone, run: &BacktestRun, zones: &ZonePolicy) -> ZoneStats {
    let mut out = ZoneStats {
        zone,
        leg_counts: Vec::new(),
        total_parlays: 0,
        wins: 0,
        total_wagered: 0.0,
        total_profit: 0.0,
        win_rate: 0.0,
        roi: 0.0,
    };
    for s in run.strategies.iter().filter(|s| zones.classify(s.leg_count()) == zone) {
        out.leg_counts.push(s.leg_count());
        out.total_parlays += s.stats.total_parlays;
        out.wins += s.stats.wins;
        out.total_wagered += s.stats.total_wagered;
        out.total_profit += s.stats.total_profit;
    }
    out.win_rate = pct(out.wins as f64, out.total_parlays as f64);
    out.roi = pct(out.total_profit, out.total_wagered);
    out
}

fn compare_zones(run: &BacktestRun, zones: &ZonePolicy) -> ZoneComparison {
    let optimal = zone_stats(Zone::Optimal, run, zones);
    let aggressive = zone_stats(Zone::Aggressive, run, zones);
    let better_zone = if optimal.total_parlays == 0 || aggressive.total_parlays == 0 {
        None
    } else if optimal.roi >= aggressive.roi {
        Some(Zone::Optimal)
    } else {
        Some(Zone::Aggressive)
    };
    ZoneComparison {
        optimal_max_legs: zones.optimal_max_legs,
        optimal,
        aggressive,
        better_zone,
    }
}

fn sport_usage(run: &BacktestRun) -> BTreeMap<Sport, u64> {
    let mut usage = BTreeMap::new();
    for leg in run.all_results().flat_map(|r| r.legs.iter()) {
        *usage.entry(leg.sport).or_insert(0u64) += 1;
    }
    usage
}

fn format_leg_counts(counts: &[usize]) -> String {
    match (counts.first(), counts.last()) {
        (Some(a), Some(b)) if a == b => format!("{a} legs"),
        (Some(a), Some(b)) => format!("{a}-{b} legs"),
        _ => "no legs".to_string(),
    }
}

fn recommendations(
    strategies: &[StrategyPerformance],
    zones: &ZoneComparison,
    breakeven: &[BreakevenRow],
) -> Vec<String> {
    let mut recs = Vec::new();

    let active: Vec<&StrategyPerformance> =
        strategies.iter().filter(|s| s.total_parlays > 0).collect();
    if active.is_empty() {
        recs.push(
            "No parlays were formed. Check that the enabled sports have enough games per day \
             for the tested leg counts."
                .to_string(),
        );
        return recs;
    }

    if let Some(best) = active.iter().copied().reduce(|a, b| if b.roi > a.roi { b } else { a }) {
        recs.push(format!(
            "Best ROI: {}-leg parlays at {:.2}% over {} parlays (final bankroll ${:.2}).",
            best.leg_count, best.roi, best.total_parlays, best.final_bankroll
        ));
    }

    match zones.better_zone {
        Some(Zone::Optimal) => recs.push(format!(
            "The optimal zone ({}) beat the aggressive zone ({}) by {:.2} ROI points; prefer shorter parlays.",
            format_leg_counts(&zones.optimal.leg_counts),
            format_leg_counts(&zones.aggressive.leg_counts),
            zones.optimal.roi - zones.aggressive.roi
        )),
        Some(Zone::Aggressive) => recs.push(format!(
            "The aggressive zone ({}) beat the optimal zone ({}) by {:.2} ROI points, at higher variance.",
            format_leg_counts(&zones.aggressive.leg_counts),
            format_leg_counts(&zones.optimal.leg_counts),
            zones.aggressive.roi - zones.optimal.roi
        )),
        None => recs.push("Not enough parlays in both zones to compare them.".to_string()),
    }

    let profitable: Vec<String> = breakeven
        .iter()
        .filter(|row| row.profitable)
        .map(|row| format!("{}-leg ({:+.2} pts)", row.leg_count, row.edge))
        .collect();
    if profitable.is_empty() {
        recs.push(
            "No strategy beat its break-even win rate; the simulated picks do not justify parlays at -110."
                .to_string(),
        );
    } else {
        recs.push(format!("Above break-even: {}.", profitable.join(", ")));
    }

    if let Some(worst) = active
        .iter()
        .copied()
        .reduce(|a, b| if b.max_drawdown_pct > a.max_drawdown_pct { b } else { a })
    {
        if worst.max_drawdown_pct > 25.0 {
            recs.push(format!(
                "{}-leg parlays drew down {:.1}% from peak; size stakes accordingly.",
                worst.leg_count, worst.max_drawdown_pct
            ));
        }
    }

    recs
}

/// Roll a finished run into its summary.
pub fn summarize(run: &BacktestRun, zones: &ZonePolicy) -> BacktestSummary {
    let strategies: Vec<StrategyPerformance> = run
        .strategies
        .iter()
        .map(|s| performance(s, run.settings.initial_bankroll, zones))
        .collect();
    let breakeven: Vec<BreakevenRow> = strategies
        .iter()
        .map(|s| breakeven_row(s.leg_count, s.win_rate))
        .collect();
    let zone_cmp = compare_zones(run, zones);
    let recommendations = recommendations(&strategies, &zone_cmp, &breakeven);

    BacktestSummary {
        metadata: RunMetadata {
            start_date: run.first_date,
            end_date: run.last_date,
            days_simulated: run.days_simulated,
            sports: run.settings.sports.clone(),
            leg_counts: run.settings.leg_counts.clone(),
            initial_bankroll: run.settings.initial_bankroll,
            bet_amount: run.settings.bet_amount,
            seed: run.settings.seed,
            oracle: run.oracle.clone(),
            legs_generated: run.legs_generated,
        },
        strategies,
        zones: zone_cmp,
        sport_usage: sport_usage(run),
        breakeven,
        calibration: Calibrator::from_run(run).report(),
        recommendations,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
