//! Historical game data.
//!
//! Loads per-sport result files into a normalized, date-indexed ledger.

pub mod ledger;

pub use ledger::{parse_game_date, GameLedger, LoadReport};
