//! Game ledger loader.
//!
//! Parses per-sport historical result CSVs into a date-indexed ledger.
//! A missing or unreadable file excludes that sport with a warning; a
//! malformed row is skipped on its own. Neither stops the load.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{GameResult, Sport};

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// One CSV row before validation. Scores stay as text so a bad cell only
/// drops its own row instead of failing deserialization of the file.
#[derive(Debug, Deserialize)]
struct RawGameRow {
    date: String,
    home_team: String,
    away_team: String,
    home_score: String,
    away_score: String,
}

/// Result of validating one raw row.
#[derive(Debug, Clone, PartialEq)]
enum RowOutcome {
    Game(GameResult),
    Tie,
    Malformed(String),
}

/// Normalize a raw date cell to a calendar date.
///
/// Accepts the 8-digit compact form (`20230115`) and any ISO-style form
/// whose first 10 characters are `YYYY-MM-DD` (`2023-01-15T19:30:00Z`).
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(raw, "%Y%m%d").ok();
    }
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_row(sport: Sport, row: RawGameRow) -> RowOutcome {
    let Some(date) = parse_game_date(&row.date) else {
        return RowOutcome::Malformed(format!("bad date {:?}", row.date));
    };
    let (Ok(home_score), Ok(away_score)) = (
        row.home_score.trim().parse::<i64>(),
        row.away_score.trim().parse::<i64>(),
    ) else {
        return RowOutcome::Malformed(format!(
            "bad score {:?}-{:?}",
            row.home_score, row.away_score
        ));
    };

    match GameResult::from_scores(
        sport,
        date,
        row.home_team.trim(),
        row.away_team.trim(),
        home_score,
        away_score,
    ) {
        Some(game) => RowOutcome::Game(game),
        None => RowOutcome::Tie,
    }
}

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// Per-sport outcome of a load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub sport: Sport,
    pub path: PathBuf,
    pub games: usize,
    pub rows_skipped: usize,
    pub ties_dropped: usize,
    /// Set when the file could not be opened; the sport is then excluded.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Date -> sport -> games, in file order within each sport.
#[derive(Debug, Clone, Default)]
pub struct GameLedger {
    index: BTreeMap<NaiveDate, BTreeMap<Sport, Vec<GameResult>>>,
    total_games: usize,
    reports: Vec<LoadReport>,
}

impl GameLedger {
    /// Load every configured source. Never fails: problems are logged and
    /// recorded in [`GameLedger::reports`].
    pub fn load(sources: &BTreeMap<Sport, PathBuf>) -> Self {
        let mut ledger = Self::default();
        for (sport, path) in sources {
            let report = ledger.load_source(*sport, path);
            ledger.reports.push(report);
        }

        info!(
            total_games = ledger.total_games,
            days = ledger.index.len(),
            sports = ledger.sports_loaded().len(),
            "Game ledger loaded"
        );
        ledger
    }

    /// Build a ledger from already-parsed games (in encounter order).
    pub fn from_games(games: impl IntoIterator<Item = GameResult>) -> Self {
        let mut ledger = Self::default();
        for game in games {
            ledger.insert(game);
        }
        ledger
    }

    fn insert(&mut self, game: GameResult) {
        self.index
            .entry(game.date)
            .or_default()
            .entry(game.sport)
            .or_default()
            .push(game);
        self.total_games += 1;
    }

    fn load_source(&mut self, sport: Sport, path: &Path) -> LoadReport {
        let mut report = LoadReport {
            sport,
            path: path.to_path_buf(),
            games: 0,
            rows_skipped: 0,
            ties_dropped: 0,
            error: None,
        };

        let mut reader = match csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_path(path)
        {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    sport = %sport,
                    path = %path.display(),
                    error = %e,
                    "Source unavailable, excluding sport"
                );
                report.error = Some(e.to_string());
                return report;
            }
        };

        for (line, record) in reader.deserialize::<RawGameRow>().enumerate() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    debug!(sport = %sport, line = line + 2, error = %e, "Unreadable row skipped");
                    report.rows_skipped += 1;
                    continue;
                }
            };
            match parse_row(sport, row) {
                RowOutcome::Game(game) => {
                    self.insert(game);
                    report.games += 1;
                }
                RowOutcome::Tie => report.ties_dropped += 1,
                RowOutcome::Malformed(reason) => {
                    debug!(sport = %sport, line = line + 2, reason = %reason, "Malformed row skipped");
                    report.rows_skipped += 1;
                }
            }
        }

        info!(
            sport = %sport,
            games = report.games,
            skipped = report.rows_skipped,
            ties = report.ties_dropped,
            "Source loaded"
        );
        report
    }

    /// Number of games across every sport and date.
    pub fn total_games(&self) -> usize {
        self.total_games
    }

    pub fn is_empty(&self) -> bool {
        self.total_games == 0
    }

    /// All dates with at least one game, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.index.keys().copied()
    }

    /// Games for one sport on one date, in file order.
    pub fn games_on(&self, date: NaiveDate, sport: Sport) -> &[GameResult] {
        self.index
            .get(&date)
            .and_then(|by_sport| by_sport.get(&sport))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sports that contributed at least one game.
    pub fn sports_loaded(&self) -> Vec<Sport> {
        let mut sports: Vec<Sport> = self
            .index
            .values()
            .flat_map(|by_sport| by_sport.keys().copied())
            .collect();
        sports.sort();
        sports.dedup();
        sports
    }

    /// Per-source load outcomes (empty for in-memory ledgers).
    pub fn reports(&self) -> &[LoadReport] {
        &self.reports
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
