//! Configuration loading from TOML.
//!
//! Reads the backtest config file and deserializes it into strongly-typed
//! structs. Every section except `[sources]` has serde defaults, so a
//! minimal file only needs to name its input CSVs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::types::{BacktestError, Sport};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub backtest: BacktestConfig,
    /// Sport key -> CSV path.
    pub sources: BTreeMap<Sport, PathBuf>,
    #[serde(default)]
    pub zones: ZoneConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BacktestConfig {
    /// Sports to include. Empty means every configured source.
    #[serde(default)]
    pub enabled_sports: Vec<Sport>,
    #[serde(default = "default_leg_counts")]
    pub leg_counts_to_test: Vec<usize>,
    #[serde(default)]
    pub max_days: Option<usize>,
    #[serde(default = "default_initial_bankroll")]
    pub initial_bankroll: f64,
    #[serde(default = "default_bet_amount")]
    pub bet_amount: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            enabled_sports: Vec::new(),
            leg_counts_to_test: default_leg_counts(),
            max_days: None,
            initial_bankroll: default_initial_bankroll(),
            bet_amount: default_bet_amount(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZoneConfig {
    /// Largest leg count still counted in the "optimal" zone.
    #[serde(default = "default_optimal_max_legs")]
    pub optimal_max_legs: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            optimal_max_legs: default_optimal_max_legs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    /// Half-width of the uniform confidence noise band.
    #[serde(default = "default_confidence_noise")]
    pub confidence_noise: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            confidence_noise: default_confidence_noise(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_winning_samples")]
    pub max_winning_samples: usize,
    #[serde(default = "default_max_recent_results")]
    pub max_recent_results: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            max_winning_samples: default_max_winning_samples(),
            max_recent_results: default_max_recent_results(),
        }
    }
}

fn default_leg_counts() -> Vec<usize> {
    vec![2, 3, 4, 5, 6]
}

fn default_initial_bankroll() -> f64 {
    10_000.0
}

fn default_bet_amount() -> f64 {
    100.0
}

fn default_seed() -> u64 {
    42
}

fn default_optimal_max_legs() -> usize {
    3
}

fn default_confidence_noise() -> f64 {
    0.05
}

fn default_output_path() -> PathBuf {
    PathBuf::from("results/parlay_backtest.json")
}

fn default_max_winning_samples() -> usize {
    20
}

fn default_max_recent_results() -> usize {
    50
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.normalize()?;
        Ok(config)
    }

    /// Sports the run will actually load, in simulation encounter order.
    pub fn active_sports(&self) -> Vec<Sport> {
        if self.backtest.enabled_sports.is_empty() {
            self.sources.keys().copied().collect()
        } else {
            self.backtest.enabled_sports.clone()
        }
    }

    /// Source paths restricted to the active sports.
    pub fn active_sources(&self) -> BTreeMap<Sport, PathBuf> {
        self.active_sports()
            .into_iter()
            .filter_map(|sport| self.sources.get(&sport).map(|p| (sport, p.clone())))
            .collect()
    }

    /// Sort and deduplicate leg counts, then check every invariant the
    /// simulator relies on.
    pub fn normalize(&mut self) -> Result<(), BacktestError> {
        let bt = &mut self.backtest;
        bt.leg_counts_to_test.sort_unstable();
        bt.leg_counts_to_test.dedup();

        let mut seen = Vec::with_capacity(bt.enabled_sports.len());
        bt.enabled_sports.retain(|s| {
            if seen.contains(s) {
                false
            } else {
                seen.push(*s);
                true
            }
        });

        if self.sources.is_empty() {
            return Err(BacktestError::Config("no [sources] configured".into()));
        }
        if bt.leg_counts_to_test.is_empty() {
            return Err(BacktestError::Config("leg_counts_to_test is empty".into()));
        }
        if bt.leg_counts_to_test.contains(&0) {
            return Err(BacktestError::Config("leg counts must be at least 1".into()));
        }
        if !(bt.initial_bankroll > 0.0) {
            return Err(BacktestError::Config(format!(
                "initial_bankroll must be positive, got {}",
                bt.initial_bankroll
            )));
        }
        if !(bt.bet_amount > 0.0) {
            return Err(BacktestError::Config(format!(
                "bet_amount must be positive, got {}",
                bt.bet_amount
            )));
        }
        if let Some(missing) = bt.enabled_sports.iter().find(|s| !self.sources.contains_key(*s)) {
            return Err(BacktestError::Config(format!(
                "enabled sport {missing} has no configured source"
            )));
        }
        if !(0.0..0.5).contains(&self.oracle.confidence_noise) {
            return Err(BacktestError::Config(format!(
                "confidence_noise must be in [0, 0.5), got {}",
                self.oracle.confidence_noise
            )));
        }
        Ok(())
    }
}
