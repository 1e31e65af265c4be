//! End-to-end simulation harness.
//!
//! Writes small historical result files to a temp directory and replays
//! them through the full load -> simulate -> summarize -> export pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parlay_backtest::backtest::{run_backtest, BacktestOutcome};
use parlay_backtest::config::AppConfig;
use parlay_backtest::oracle::StatisticalOracle;
use parlay_backtest::storage::{load_bundle, save_bundle, ExportBundle, SampleLimits};
use parlay_backtest::strategy::payout_multiplier;
use parlay_backtest::types::{BacktestError, Sport};

use super::mock_oracle::MockOracle;

const NFL_CSV: &str = "\
date,home_team,away_team,home_score,away_score
20230101,Bills,Dolphins,27,17
20230101,Jets,Patriots,20,17
20230102,Chiefs,Raiders,30,10
20230103,Eagles,Giants,24,21
20230103,Bears,Packers,10,10
20230103,Browns,Steelers,x,14
";

const NBA_CSV: &str = "\
date,home_team,away_team,home_score,away_score
2023-01-01T19:00:00,Lakers,Clippers,120,100
2023-01-01T19:30:00,Heat,Magic,101,100
2023-01-03,Knicks,Nets,110,105
2023-01-03,Suns,Jazz,99,90
";

fn temp_dir(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("parlay_it_{tag}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(body: &str) -> AppConfig {
    AppConfig::from_toml_str(body).unwrap()
}

/// A season-sized fixture: `days` days with `per_day` games in each of
/// two sports.
fn season_fixture(dir: &Path, days: u32, per_day: u32) -> AppConfig {
    let mut nfl = String::from("date,home_team,away_team,home_score,away_score\n");
    let mut nhl = String::from("date,home_team,away_team,home_score,away_score,overtime\n");
    for d in 0..days {
        let date = chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + chrono::Duration::days(d as i64);
        for g in 0..per_day {
            let margin = 1 + (d * 7 + g * 3) % 24;
            nfl.push_str(&format!(
                "{},NFL-H{g},NFL-A{g},{},{}\n",
                date.format("%Y%m%d"),
                10 + margin,
                10
            ));
            let (home, away) = if (d + g) % 2 == 0 { (2 + margin % 5, 1) } else { (1, 2 + margin % 5) };
            nhl.push_str(&format!("{}T00:00:00,NHL-H{g},NHL-A{g},{home},{away},no\n", date.format("%Y-%m-%d")));
        }
    }
    let nfl_path = write(dir, "nfl.csv", &nfl);
    let nhl_path = write(dir, "nhl.csv", &nhl);

    config(&format!(
        r#"
        [backtest]
        leg_counts_to_test = [2, 3, 4, 5, 6]
        initial_bankroll = 10000.0
        bet_amount = 100.0
        seed = 2024

        [sources]
        nfl = '{}'
        nhl = '{}'
        "#,
        nfl_path.display(),
        nhl_path.display()
    ))
}

fn assert_core_invariants(outcome: &BacktestOutcome) {
    let run = &outcome.run;

    for s in &run.strategies {
        assert_eq!(s.stats.wins + s.stats.losses, s.stats.total_parlays);
        assert_eq!(s.results.len() as u64, s.stats.total_parlays);

        let mut bankroll = run.settings.initial_bankroll;
        let mut last_date = None;
        for r in &s.results {
            bankroll += r.profit_loss;
            assert_eq!(r.bankroll_after, bankroll);
            assert_eq!(r.legs.len(), s.leg_count());
            if r.legs.iter().any(|l| !l.is_correct) {
                assert!(!r.parlay_won);
                assert_eq!(r.profit_loss, -r.bet_amount);
            }
            assert!(last_date < Some(r.date));
            last_date = Some(r.date);
        }
        assert_eq!(s.final_bankroll, bankroll);
    }

    // Per date, shorter parlays are prefixes of longer ones.
    let mut by_date: BTreeMap<_, Vec<_>> = BTreeMap::new();
    for r in run.all_results() {
        by_date.entry(r.date).or_default().push(r);
    }
    for parlays in by_date.values() {
        let mut sorted = parlays.clone();
        sorted.sort_by_key(|r| r.leg_count);
        for pair in sorted.windows(2) {
            let (small, big) = (pair[0], pair[1]);
            assert!(big.leg_count > small.leg_count);
            assert_eq!(small.legs[..], big.legs[..small.leg_count]);
            for w in big.legs.windows(2) {
                assert!(w[0].confidence >= w[1].confidence);
            }
        }
    }

    for row in &outcome.summary.breakeven {
        assert!((row.breakeven_win_rate - 100.0 / payout_multiplier(row.leg_count)).abs() < 1e-9);
    }
    for pair in outcome.summary.breakeven.windows(2) {
        assert!(pair[1].payout_multiplier > pair[0].payout_multiplier);
    }
}

#[test]
fn test_scripted_run_end_to_end() {
    let dir = temp_dir("scripted");
    let nfl = write(&dir, "nfl.csv", NFL_CSV);
    let nba = write(&dir, "nba.csv", NBA_CSV);
    let cfg = config(&format!(
        r#"
        [backtest]
        enabled_sports = ["nba", "nfl"]
        leg_counts_to_test = [2, 3, 4]
        initial_bankroll = 1000.0
        bet_amount = 50.0

        [sources]
        nfl = '{}'
        nba = '{}'
        "#,
        nfl.display(),
        nba.display()
    ));

    let oracle = MockOracle::with_misses(&["Jets"]);
    let outcome = run_backtest(&cfg, Box::new(oracle.clone())).unwrap();
    assert_core_invariants(&outcome);

    // Sports in configured order, then file order; ties and bad rows gone.
    let seen: Vec<String> = oracle.seen().into_iter().map(|g| g.home_team).collect();
    assert_eq!(
        seen,
        vec!["Lakers", "Heat", "Bills", "Jets", "Chiefs", "Knicks", "Suns", "Eagles"]
    );

    let run = &outcome.run;
    assert_eq!(run.days_simulated, 3);

    // Day 1 ranks Lakers, Bills, Jets, Heat: 2 legs hit, 3 and 4 include the Jets miss.
    // Day 2 has a single game: no parlays.
    // Day 3 ranks Suns, Knicks, Eagles: 2 and 3 legs hit, not enough games for 4.
    let two = run.strategy(2).unwrap();
    let three = run.strategy(3).unwrap();
    let four = run.strategy(4).unwrap();
    assert_eq!((two.stats.total_parlays, two.stats.wins), (2, 2));
    assert_eq!((three.stats.total_parlays, three.stats.wins), (2, 1));
    assert_eq!((four.stats.total_parlays, four.stats.wins), (1, 0));

    let day1_two: Vec<&str> = two.results[0].legs.iter().map(|l| l.team.as_str()).collect();
    assert_eq!(day1_two, vec!["Lakers", "Bills"]);
    assert_eq!(two.results[0].sports_used, vec![Sport::Nba, Sport::Nfl]);

    let expected = 1000.0 + 2.0 * (50.0 * payout_multiplier(2) - 50.0);
    assert!((two.final_bankroll - expected).abs() < 1e-9);
    assert!((four.final_bankroll - 950.0).abs() < 1e-9);

    let summary = &outcome.summary;
    // Leg-level counts across every parlay placed.
    assert_eq!(summary.sport_usage[&Sport::Nba], 1 + 1 + 2 + 2 + 2);
    assert_eq!(summary.sport_usage[&Sport::Nfl], 1 + 2 + 2 + 1);
    assert_eq!(summary.zones.optimal.total_parlays, 4);
    assert_eq!(summary.zones.aggressive.total_parlays, 1);
    assert_eq!(summary.calibration.total_legs, 7);

    let reports = &outcome.load_reports;
    let nfl_report = reports.iter().find(|r| r.sport == Sport::Nfl).unwrap();
    assert_eq!(nfl_report.games, 4);
    assert_eq!(nfl_report.ties_dropped, 1);
    assert_eq!(nfl_report.rows_skipped, 1);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_reference_oracle_season() {
    let dir = temp_dir("season");
    let cfg = season_fixture(&dir, 60, 3);

    let outcome = run_backtest(&cfg, Box::new(StatisticalOracle::default())).unwrap();
    assert_core_invariants(&outcome);

    let run = &outcome.run;
    assert_eq!(run.days_simulated, 60);
    // Six games a day: every strategy forms a parlay every day.
    for s in &run.strategies {
        assert_eq!(s.stats.total_parlays, 60);
    }
    assert_eq!(run.legs_generated, 60 * 6);
    assert_eq!(outcome.summary.metadata.sports, vec![Sport::Nfl, Sport::Nhl]);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_seed_controls_reproducibility() {
    let dir = temp_dir("seed");
    let mut cfg = season_fixture(&dir, 30, 3);

    let a = run_backtest(&cfg, Box::new(StatisticalOracle::default())).unwrap();
    let b = run_backtest(&cfg, Box::new(StatisticalOracle::default())).unwrap();
    assert_eq!(a.run, b.run);
    assert_eq!(a.summary, b.summary);

    cfg.backtest.seed += 1;
    let c = run_backtest(&cfg, Box::new(StatisticalOracle::default())).unwrap();
    let picks = |o: &BacktestOutcome| -> Vec<(bool, u64)> {
        o.run
            .strategy(6)
            .unwrap()
            .results
            .iter()
            .flat_map(|r| r.legs.iter().map(|l| (l.is_correct, l.confidence.to_bits())))
            .collect()
    };
    assert_ne!(picks(&a), picks(&c));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_max_days_limits_run() {
    let dir = temp_dir("maxdays");
    let mut cfg = season_fixture(&dir, 20, 2);
    cfg.backtest.max_days = Some(5);

    let outcome = run_backtest(&cfg, Box::new(StatisticalOracle::default())).unwrap();
    assert_eq!(outcome.run.days_simulated, 5);
    assert_eq!(outcome.summary.metadata.days_simulated, 5);
    // Four games a day: 5- and 6-leg strategies never form a parlay.
    assert_eq!(outcome.run.strategy(5).unwrap().stats.total_parlays, 0);
    assert_eq!(outcome.run.strategy(6).unwrap().stats.win_rate(), 0.0);
    assert_eq!(outcome.run.strategy(6).unwrap().stats.roi(), 0.0);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_missing_source_excluded_not_fatal() {
    let dir = temp_dir("partial");
    let nba = write(&dir, "nba.csv", NBA_CSV);
    let cfg = config(&format!(
        r#"
        [backtest]
        leg_counts_to_test = [2]

        [sources]
        nfl = '{}'
        nba = '{}'
        "#,
        dir.join("does_not_exist.csv").display(),
        nba.display()
    ));

    let outcome = run_backtest(&cfg, Box::new(MockOracle::new())).unwrap();
    assert!(outcome
        .load_reports
        .iter()
        .any(|r| r.sport == Sport::Nfl && r.error.is_some()));
    assert!(outcome.run.all_results().all(|r| r.sports_used == vec![Sport::Nba]));
    assert_eq!(outcome.run.strategy(2).unwrap().stats.total_parlays, 2);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_no_data_is_explicit_error() {
    let dir = temp_dir("empty");
    let empty = write(&dir, "nfl.csv", "date,home_team,away_team,home_score,away_score\n");
    let cfg = config(&format!(
        r#"
        [sources]
        nfl = '{}'
        nba = '{}'
        "#,
        empty.display(),
        dir.join("missing.csv").display()
    ));

    let oracle = MockOracle::new();
    let result = run_backtest(&cfg, Box::new(oracle.clone()));
    assert!(matches!(result, Err(BacktestError::NoData)));
    assert!(oracle.seen().is_empty());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_export_after_summary() {
    let dir = temp_dir("export");
    let cfg = season_fixture(&dir, 15, 3);
    let outcome = run_backtest(&cfg, Box::new(StatisticalOracle::default())).unwrap();

    let bundle = ExportBundle::new(
        outcome.summary.clone(),
        &outcome.run,
        SampleLimits { max_winning: 5, max_recent: 10 },
    );
    let path = dir.join("out").join("results.json");
    save_bundle(&bundle, &path).unwrap();

    let loaded = load_bundle(&path).unwrap();
    assert_eq!(loaded.run_id, bundle.run_id);
    assert_eq!(loaded.recent_results.len(), 10);
    assert!(loaded.winning_samples.len() <= 5);
    assert_eq!(loaded.summary.metadata, outcome.summary.metadata);
    assert_eq!(loaded.summary.recommendations, outcome.summary.recommendations);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_export_samples_follow_the_calendar() {
    let dir = temp_dir("samples");
    let cfg = season_fixture(&dir, 10, 3);
    // No misses: every strategy wins every day.
    let outcome = run_backtest(&cfg, Box::new(MockOracle::new())).unwrap();

    let bundle = ExportBundle::new(
        outcome.summary.clone(),
        &outcome.run,
        SampleLimits { max_winning: 12, max_recent: 50 },
    );

    let keys: Vec<_> = bundle
        .winning_samples
        .iter()
        .map(|r| (r.date, r.leg_count))
        .collect();
    assert_eq!(keys.len(), 12);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    // Five leg counts a day: the first twelve winners span three days.
    let first_day = outcome.run.first_date.unwrap();
    assert_eq!(keys[0], (first_day, 2));
    assert_eq!(keys[4], (first_day, 6));
    assert_eq!(keys[5].1, 2);
    let leg_counts: std::collections::BTreeSet<usize> = keys.iter().map(|k| k.1).collect();
    assert_eq!(leg_counts.len(), 5);

    assert_eq!(bundle.recent_results.len(), 50);
    assert!(bundle
        .recent_results
        .windows(2)
        .all(|w| (w[0].date, w[0].leg_count) < (w[1].date, w[1].leg_count)));
    assert_eq!(bundle.recent_results.last().unwrap().date, outcome.run.last_date.unwrap());

    std::fs::remove_dir_all(dir).unwrap();
}
