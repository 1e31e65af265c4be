//! Prediction oracles.
//!
//! Defines the `PredictionOracle` trait that turns a historical game into a
//! simulated parlay leg, plus the deterministic per-date random streams the
//! simulator feeds it. Any real model can replace the reference policy
//! without touching selection, simulation or aggregation.

pub mod reference;

use chrono::{Datelike, NaiveDate};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;

use crate::types::{GameResult, ParlayLeg};

pub use reference::StatisticalOracle;

/// Abstraction over leg predictors.
///
/// Implementors must draw all randomness from `rng` so that a run is
/// reproducible from its seed.
pub trait PredictionOracle: Send + Sync {
    /// Produce a simulated pick for one completed game.
    fn predict(&self, game: &GameResult, rng: &mut dyn RngCore) -> ParlayLeg;

    /// Identifier recorded in run metadata.
    fn name(&self) -> &str;
}

/// Build the random stream for one simulated date.
///
/// Each date gets its own stream derived from the run seed, so days can be
/// replayed in isolation (or in parallel) and still match a full run.
pub fn day_rng(seed: u64, date: NaiveDate) -> Pcg64 {
    let ordinal = date.num_days_from_ce() as u64;
    Pcg64::seed_from_u64(splitmix64(seed ^ splitmix64(ordinal)))
}

/// SplitMix64 finalizer: spreads nearby inputs across the full u64 range.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
