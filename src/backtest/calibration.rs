//! Leg calibration.
//!
//! Measures how well oracle confidence matched reality on the legs that
//! actually went into parlays. Computes a calibration curve, an overall
//! Brier score and per-sport hit rates, and diagnoses over- or
//! under-confidence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::runner::BacktestRun;
use crate::types::{ParlayResult, Sport};

// ---------------------------------------------------------------------------
// Calibration data
// ---------------------------------------------------------------------------

/// A single confidence–outcome pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPoint {
    pub sport: Sport,
    pub confidence: f64,
    pub is_correct: bool,
}

/// Calibration analysis results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub total_legs: usize,
    pub overall_brier: f64,
    pub sport_accuracy: BTreeMap<Sport, SportAccuracy>,
    pub calibration_curve: Vec<CalibrationBucket>,
    pub diagnosis: CalibrationDiagnosis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportAccuracy {
    pub legs: usize,
    pub hits: usize,
    /// Percentage.
    pub hit_rate: f64,
}

/// A bucket in the calibration curve (e.g. all legs with confidence 0.60-0.65).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBucket {
    pub bin_start: f64,
    pub bin_end: f64,
    pub mean_confidence: f64,
    pub hit_rate: f64,
    pub count: usize,
    /// |mean_confidence - hit_rate|
    pub deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationDiagnosis {
    WellCalibrated,
    OverConfident,
    UnderConfident,
    InsufficientData,
}

// ---------------------------------------------------------------------------
// Calibrator
// ---------------------------------------------------------------------------

pub struct Calibrator {
    points: Vec<CalibrationPoint>,
    num_bins: usize,
    /// Confidence range covered by the curve. Oracle confidence never drops
    /// below 0.5, so the default curve starts there.
    range: (f64, f64),
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            num_bins: 10,
            range: (0.5, 1.0),
        }
    }

    /// Collect every distinct leg a run wagered on.
    ///
    /// Each date's parlays are prefixes of one ranking, so the longest
    /// parlay of the day already holds every leg the shorter ones used.
    pub fn from_run(run: &BacktestRun) -> Self {
        let mut longest: BTreeMap<NaiveDate, &ParlayResult> = BTreeMap::new();
        for result in run.all_results() {
            longest
                .entry(result.date)
                .and_modify(|cur| {
                    if result.leg_count > cur.leg_count {
                        *cur = result;
                    }
                })
                .or_insert(result);
        }

        let mut cal = Self::new();
        cal.add_points(longest.values().flat_map(|r| {
            r.legs.iter().map(|leg| CalibrationPoint {
                sport: leg.sport,
                confidence: leg.confidence,
                is_correct: leg.is_correct,
            })
        }));
        cal
    }

    pub fn add_point(&mut self, point: CalibrationPoint) {
        self.points.push(point);
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = CalibrationPoint>) {
        self.points.extend(points);
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Generate a full calibration report.
    pub fn report(&self) -> CalibrationReport {
        if self.points.is_empty() {
            return CalibrationReport {
                total_legs: 0,
                overall_brier: 0.0,
                sport_accuracy: BTreeMap::new(),
                calibration_curve: Vec::new(),
                diagnosis: CalibrationDiagnosis::InsufficientData,
            };
        }

        let calibration_curve = self.compute_curve();
        let diagnosis = self.diagnose(&calibration_curve);

        CalibrationReport {
            total_legs: self.points.len(),
            overall_brier: brier(&self.points),
            sport_accuracy: self.compute_sport_accuracy(),
            calibration_curve,
            diagnosis,
        }
    }

    fn compute_sport_accuracy(&self) -> BTreeMap<Sport, SportAccuracy> {
        let mut by_sport: BTreeMap<Sport, (usize, usize)> = BTreeMap::new();
        for p in &self.points {
            let entry = by_sport.entry(p.sport).or_default();
            entry.0 += 1;
            if p.is_correct {
                entry.1 += 1;
            }
        }
        by_sport
            .into_iter()
            .map(|(sport, (legs, hits))| {
                let hit_rate = if legs == 0 { 0.0 } else { hits as f64 / legs as f64 * 100.0 };
                (sport, SportAccuracy { legs, hits, hit_rate })
            })
            .collect()
    }

    fn compute_curve(&self) -> Vec<CalibrationBucket> {
        let (lo, hi) = self.range;
        let bin_width = (hi - lo) / self.num_bins as f64;
        let mut buckets = Vec::with_capacity(self.num_bins);

        for i in 0..self.num_bins {
            let bin_start = lo + i as f64 * bin_width;
            let bin_end = bin_start + bin_width;
            let last = i == self.num_bins - 1;

            let in_bin: Vec<&CalibrationPoint> = self
                .points
                .iter()
                .filter(|p| {
                    p.confidence >= bin_start && (p.confidence < bin_end || (last && p.confidence <= hi))
                })
                .collect();

            if in_bin.is_empty() {
                buckets.push(CalibrationBucket {
                    bin_start,
                    bin_end,
                    mean_confidence: (bin_start + bin_end) / 2.0,
                    hit_rate: 0.0,
                    count: 0,
                    deviation: 0.0,
                });
                continue;
            }

            let count = in_bin.len();
            let mean_confidence = in_bin.iter().map(|p| p.confidence).sum::<f64>() / count as f64;
            let hit_rate = in_bin.iter().filter(|p| p.is_correct).count() as f64 / count as f64;

            buckets.push(CalibrationBucket {
                bin_start,
                bin_end,
                mean_confidence,
                hit_rate,
                count,
                deviation: (mean_confidence - hit_rate).abs(),
            });
        }

        buckets
    }

    fn diagnose(&self, curve: &[CalibrationBucket]) -> CalibrationDiagnosis {
        let populated: Vec<&CalibrationBucket> = curve.iter().filter(|b| b.count >= 3).collect();

        if populated.len() < 3 || self.points.len() < 20 {
            return CalibrationDiagnosis::InsufficientData;
        }

        let mut over = 0;
        let mut under = 0;
        for bucket in &populated {
            if bucket.deviation < 0.05 {
                continue;
            }
            if bucket.hit_rate < bucket.mean_confidence {
                over += 1;
            } else {
                under += 1;
            }
        }

        if over > under + 1 {
            CalibrationDiagnosis::OverConfident
        } else if under > over + 1 {
            CalibrationDiagnosis::UnderConfident
        } else {
            CalibrationDiagnosis::WellCalibrated
        }
    }
}

/// Brier = (1/N) * Σ(confidence - outcome)². 0 is perfect.
fn brier(points: &[CalibrationPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum: f64 = points
        .iter()
        .map(|p| {
            let outcome = if p.is_correct { 1.0 } else { 0.0 };
            (p.confidence - outcome).powi(2)
        })
        .sum();
    sum / points.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
