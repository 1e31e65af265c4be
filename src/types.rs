//! Shared types for the parlay backtester.
//!
//! These types form the data model used across the loader, oracle,
//! selector, simulator and aggregator. They carry no behaviour beyond
//! small derived accessors so every stage can depend on them without
//! circular references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Sport
// ---------------------------------------------------------------------------

/// A league whose historical results can be replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Sport {
    Nfl,
    Nba,
    Mlb,
    Nhl,
    Ncaaf,
    Ncaab,
}

impl Sport {
    /// All known sports (useful for iteration).
    pub const ALL: &'static [Sport] = &[
        Sport::Nfl,
        Sport::Nba,
        Sport::Mlb,
        Sport::Nhl,
        Sport::Ncaaf,
        Sport::Ncaab,
    ];

    /// Lowercase key used in configuration files and exported artifacts.
    pub fn key(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Nba => "nba",
            Sport::Mlb => "mlb",
            Sport::Nhl => "nhl",
            Sport::Ncaaf => "ncaaf",
            Sport::Ncaab => "ncaab",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::Nfl => write!(f, "NFL"),
            Sport::Nba => write!(f, "NBA"),
            Sport::Mlb => write!(f, "MLB"),
            Sport::Nhl => write!(f, "NHL"),
            Sport::Ncaaf => write!(f, "NCAAF"),
            Sport::Ncaab => write!(f, "NCAAB"),
        }
    }
}

/// Parse a sport key (case-insensitive).
impl std::str::FromStr for Sport {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nfl" => Ok(Sport::Nfl),
            "nba" => Ok(Sport::Nba),
            "mlb" => Ok(Sport::Mlb),
            "nhl" => Ok(Sport::Nhl),
            "ncaaf" | "cfb" => Ok(Sport::Ncaaf),
            "ncaab" | "cbb" => Ok(Sport::Ncaab),
            _ => Err(BacktestError::Config(format!("Unknown sport: {s}"))),
        }
    }
}

impl TryFrom<String> for Sport {
    type Error = BacktestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Games and legs
// ---------------------------------------------------------------------------

/// A completed, non-tied historical game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub sport: Sport,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i64,
    pub away_score: i64,
    pub winner: String,
    /// Absolute score difference (always > 0).
    pub margin: u32,
}

impl GameResult {
    /// Build a result from raw scores. Returns `None` for a tie.
    pub fn from_scores(
        sport: Sport,
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_score: i64,
        away_score: i64,
    ) -> Option<Self> {
        if home_score == away_score {
            return None;
        }
        let home_team = home_team.into();
        let away_team = away_team.into();
        let winner = if home_score > away_score {
            home_team.clone()
        } else {
            away_team.clone()
        };
        let margin = u32::try_from(home_score.abs_diff(away_score)).unwrap_or(u32::MAX);

        Some(Self {
            sport,
            date,
            home_team,
            away_team,
            home_score,
            away_score,
            winner,
            margin,
        })
    }

    /// The losing side.
    pub fn loser(&self) -> &str {
        if self.winner == self.home_team {
            &self.away_team
        } else {
            &self.home_team
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] {} {} - {} {} (winner: {}, margin {})",
            self.sport,
            self.date,
            self.home_team,
            self.home_score,
            self.away_score,
            self.away_team,
            self.winner,
            self.margin,
        )
    }
}

/// One simulated single-game pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub sport: Sport,
    /// Home side of the underlying game.
    pub team: String,
    /// Away side of the underlying game.
    pub opponent: String,
    pub predicted_winner: String,
    pub actual_winner: String,
    pub is_correct: bool,
    /// Oracle confidence in [0, 1].
    pub confidence: f64,
    pub margin: u32,
}

impl fmt::Display for ParlayLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} vs {} -> {} ({:.0}% conf, {})",
            self.sport,
            self.team,
            self.opponent,
            self.predicted_winner,
            self.confidence * 100.0,
            if self.is_correct { "hit" } else { "miss" },
        )
    }
}

// ---------------------------------------------------------------------------
// Parlay results and strategy statistics
// ---------------------------------------------------------------------------

/// One settled parlay for a given (date, leg count).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayResult {
    pub date: NaiveDate,
    pub leg_count: usize,
    pub legs: Vec<ParlayLeg>,
    pub parlay_won: bool,
    pub bet_amount: f64,
    pub payout: f64,
    pub profit_loss: f64,
    pub bankroll_after: f64,
    /// Distinct sports in leg order of first appearance.
    pub sports_used: Vec<Sport>,
}

impl fmt::Display for ParlayResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.profit_loss >= 0.0 { "+" } else { "" };
        write!(
            f,
            "{} {}-leg {} stake=${:.2} pnl={sign}{:.2} bankroll=${:.2}",
            self.date,
            self.leg_count,
            if self.parlay_won { "WON" } else { "LOST" },
            self.bet_amount,
            self.profit_loss,
            self.bankroll_after,
        )
    }
}

/// Running accumulator for one leg-count strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub leg_count: usize,
    pub total_parlays: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_wagered: f64,
    pub total_profit: f64,
    pub best_day_profit: f64,
    pub worst_day_loss: f64,
}

impl StrategyStats {
    pub fn new(leg_count: usize) -> Self {
        Self {
            leg_count,
            total_parlays: 0,
            wins: 0,
            losses: 0,
            total_wagered: 0.0,
            total_profit: 0.0,
            best_day_profit: 0.0,
            worst_day_loss: 0.0,
        }
    }

    /// Fold one settled parlay into the accumulator.
    pub fn record(&mut self, won: bool, bet_amount: f64, profit_loss: f64) {
        self.total_parlays += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.total_wagered += bet_amount;
        self.total_profit += profit_loss;
        self.best_day_profit = self.best_day_profit.max(profit_loss);
        self.worst_day_loss = self.worst_day_loss.min(profit_loss);
    }

    /// Win rate as a percentage. Returns 0.0 if no parlays were placed.
    pub fn win_rate(&self) -> f64 {
        if self.total_parlays == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_parlays as f64 * 100.0
        }
    }

    /// Return on investment as a percentage. Returns 0.0 if nothing was wagered.
    pub fn roi(&self) -> f64 {
        if self.total_wagered == 0.0 {
            0.0
        } else {
            self.total_profit / self.total_wagered * 100.0
        }
    }
}

impl fmt::Display for StrategyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-leg | parlays={} (W{}/L{}) | win_rate={:.2}% | roi={:.2}% | profit=${:.2}",
            self.leg_count,
            self.total_parlays,
            self.wins,
            self.losses,
            self.win_rate(),
            self.roi(),
            self.total_profit,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the backtester.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("No game data loaded from any configured source")]
    NoData,

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
