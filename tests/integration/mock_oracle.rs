//! Mock oracle for integration testing.
//!
//! Provides a deterministic `PredictionOracle` whose correctness and
//! confidence are fully controlled by test code, and which records every
//! game it was asked about.

use rand::RngCore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use parlay_backtest::oracle::PredictionOracle;
use parlay_backtest::types::{GameResult, ParlayLeg};

/// A scripted oracle for deterministic testing.
///
/// Picks for home teams listed in `misses` are wrong; everything else is
/// right. Confidence is `base_confidence + margin / 1000`, so larger
/// margins rank higher.
#[derive(Clone)]
pub struct MockOracle {
    misses: HashSet<String>,
    base_confidence: f64,
    seen: Arc<Mutex<Vec<GameResult>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            misses: HashSet::new(),
            base_confidence: 0.6,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make picks on these home teams incorrect.
    pub fn with_misses(teams: &[&str]) -> Self {
        let mut oracle = Self::new();
        oracle.misses = teams.iter().map(|t| t.to_string()).collect();
        oracle
    }

    /// Every game predicted so far, in call order.
    pub fn seen(&self) -> Vec<GameResult> {
        self.seen.lock().unwrap().clone()
    }
}

impl PredictionOracle for MockOracle {
    fn predict(&self, game: &GameResult, _rng: &mut dyn RngCore) -> ParlayLeg {
        self.seen.lock().unwrap().push(game.clone());
        let is_correct = !self.misses.contains(&game.home_team);
        ParlayLeg {
            sport: game.sport,
            team: game.home_team.clone(),
            opponent: game.away_team.clone(),
            predicted_winner: if is_correct {
                game.winner.clone()
            } else {
                game.loser().to_string()
            },
            actual_winner: game.winner.clone(),
            is_correct,
            confidence: (self.base_confidence + f64::from(game.margin) / 1000.0).min(0.99),
            margin: game.margin,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
