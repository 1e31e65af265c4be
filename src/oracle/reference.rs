//! Reference statistical oracle.
//!
//! A stand-in policy used to exercise the harness: it decides whether a
//! pick would have been right from a per-sport base accuracy plus a
//! blowout bonus, and labels it with a margin-driven confidence that is
//! deliberately noisy so calibration is not trivially perfect.

use rand::{Rng, RngCore};

use super::PredictionOracle;
use crate::types::{GameResult, ParlayLeg, Sport};

/// How often a pick in each sport is assumed to be callable.
const BASE_ACCURACY: &[(Sport, f64)] = &[
    (Sport::Nfl, 0.60),
    (Sport::Nba, 0.64),
    (Sport::Mlb, 0.55),
    (Sport::Nhl, 0.57),
    (Sport::Ncaaf, 0.66),
    (Sport::Ncaab, 0.63),
];

/// Cap on the accuracy bonus from a lopsided final score.
const MAX_MARGIN_BONUS: f64 = 0.15;
/// Margin beyond which confidence stops growing.
const CONFIDENCE_MARGIN_CAP: u32 = 25;
const CONFIDENCE_FLOOR: f64 = 0.50;
const CONFIDENCE_CEILING: f64 = 0.99;

/// Per-sport base accuracy.
pub fn base_accuracy(sport: Sport) -> f64 {
    BASE_ACCURACY
        .iter()
        .find(|(s, _)| *s == sport)
        .map(|(_, acc)| *acc)
        .unwrap_or(0.55)
}

/// Extra accuracy for blowouts: `min(margin / 100, 0.15)`.
pub fn margin_bonus(margin: u32) -> f64 {
    (f64::from(margin) / 100.0).min(MAX_MARGIN_BONUS)
}

#[derive(Debug, Clone)]
pub struct StatisticalOracle {
    /// Half-width of the uniform confidence noise band.
    confidence_noise: f64,
}

impl Default for StatisticalOracle {
    fn default() -> Self {
        Self {
            confidence_noise: 0.05,
        }
    }
}

impl StatisticalOracle {
    pub fn new(confidence_noise: f64) -> Self {
        Self {
            confidence_noise: confidence_noise.abs(),
        }
    }

    fn confidence(&self, margin: u32, rng: &mut dyn RngCore) -> f64 {
        let noise = if self.confidence_noise > 0.0 {
            rng.gen_range(-self.confidence_noise..=self.confidence_noise)
        } else {
            0.0
        };
        let capped = f64::from(margin.min(CONFIDENCE_MARGIN_CAP));
        (0.55 + capped / 50.0 + noise).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
    }
}

impl PredictionOracle for StatisticalOracle {
    fn predict(&self, game: &GameResult, rng: &mut dyn RngCore) -> ParlayLeg {
        let hit_probability = base_accuracy(game.sport) + margin_bonus(game.margin);
        let draw: f64 = rng.gen();
        let is_correct = draw < hit_probability;

        let predicted_winner = if is_correct {
            game.winner.clone()
        } else {
            game.loser().to_string()
        };

        ParlayLeg {
            sport: game.sport,
            team: game.home_team.clone(),
            opponent: game.away_team.clone(),
            predicted_winner,
            actual_winner: game.winner.clone(),
            is_correct,
            confidence: self.confidence(game.margin, rng),
            margin: game.margin,
        }
    }

    fn name(&self) -> &str {
        "statistical-reference"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
