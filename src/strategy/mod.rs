//! Parlay construction: ranking a day's picks and pricing the result.

pub mod payout;
pub mod selector;

pub use payout::{payout_multiplier, settle, Settlement, SINGLE_LEG_DECIMAL_ODDS};
pub use selector::RankedSlate;
