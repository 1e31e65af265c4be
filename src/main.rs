//! Parlay backtester CLI.
//!
//! Loads configuration, initialises structured logging, replays the
//! configured historical results through every leg-count strategy, and
//! exports the summary once it is fully computed.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use parlay_backtest::backtest::{self, BacktestSummary};
use parlay_backtest::config::AppConfig;
use parlay_backtest::oracle::StatisticalOracle;
use parlay_backtest::storage::{self, ExportBundle, SampleLimits};

#[derive(Parser, Debug)]
#[command(name = "parlay-backtest")]
#[command(about = "Replay historical games through multi-leg parlay strategies")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = "backtest.toml")]
    config: String,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the cap on simulated days
    #[arg(long)]
    max_days: Option<usize>,

    /// Override the output artifact path
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args = Args::parse();
    init_logging();

    let mut cfg = AppConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        cfg.backtest.seed = seed;
    }
    if args.max_days.is_some() {
        cfg.backtest.max_days = args.max_days;
    }
    if let Some(output) = args.output {
        cfg.output.path = output;
    }

    info!(
        config = %args.config,
        sports = ?cfg.active_sports(),
        leg_counts = ?cfg.backtest.leg_counts_to_test,
        initial_bankroll = cfg.backtest.initial_bankroll,
        bet_amount = cfg.backtest.bet_amount,
        seed = cfg.backtest.seed,
        "Parlay backtest starting"
    );

    let oracle = StatisticalOracle::new(cfg.oracle.confidence_noise);
    let outcome = backtest::run_backtest(&cfg, Box::new(oracle))?;

    for report in outcome.load_reports.iter().filter(|r| r.error.is_some()) {
        warn!(sport = %report.sport, path = %report.path.display(), "Sport excluded from run");
    }
    log_summary(&outcome.summary);

    let bundle = ExportBundle::new(
        outcome.summary,
        &outcome.run,
        SampleLimits {
            max_winning: cfg.output.max_winning_samples,
            max_recent: cfg.output.max_recent_results,
        },
    );
    let path = storage::save_bundle(&bundle, &cfg.output.path)?;
    info!(path = %path.display(), run_id = %bundle.run_id, "Done");

    Ok(())
}

/// Log a human-readable summary.
fn log_summary(summary: &BacktestSummary) {
    for s in &summary.strategies {
        info!(
            legs = s.leg_count,
            zone = %s.zone,
            parlays = s.total_parlays,
            win_rate = format!("{:.2}%", s.win_rate),
            roi = format!("{:.2}%", s.roi),
            bankroll = format!("${:.2}", s.final_bankroll),
            best_day = format!("${:.2}", s.best_day_profit),
            worst_day = format!("${:.2}", s.worst_day_loss),
            "Strategy result"
        );
    }
    for row in &summary.breakeven {
        info!(
            legs = row.leg_count,
            breakeven = format!("{:.2}%", row.breakeven_win_rate),
            actual = format!("{:.2}%", row.actual_win_rate),
            edge = format!("{:+.2}", row.edge),
            profitable = row.profitable,
            "Break-even"
        );
    }
    for rec in &summary.recommendations {
        info!("{rec}");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parlay_backtest=info"));

    if std::env::var("PARLAY_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
