//! Parlay payout calculation.
//!
//! Every leg is priced at flat -110, so an L-leg parlay pays the single-leg
//! decimal odds compounded L times. A parlay pays only if every leg hits.

use crate::types::ParlayLeg;

/// Flat -110 American odds in decimal form: `1 + 100/110`.
pub const SINGLE_LEG_DECIMAL_ODDS: f64 = 1.0 + 100.0 / 110.0;

/// Convert American odds to decimal odds (`-110` -> ~1.909, `+150` -> 2.5).
pub fn american_to_decimal(american: f64) -> f64 {
    if american < 0.0 {
        1.0 + 100.0 / american.abs()
    } else {
        1.0 + american / 100.0
    }
}

/// Compounded payout multiplier for an L-leg parlay.
pub fn payout_multiplier(leg_count: usize) -> f64 {
    let exp = i32::try_from(leg_count).unwrap_or(i32::MAX);
    SINGLE_LEG_DECIMAL_ODDS.powi(exp)
}

/// Outcome of settling one parlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub won: bool,
    /// Gross return including the stake (0 on a loss).
    pub payout: f64,
    pub profit_loss: f64,
}

/// Settle a parlay at a flat stake. No partial credit.
pub fn settle(legs: &[ParlayLeg], bet_amount: f64) -> Settlement {
    let won = !legs.is_empty() && legs.iter().all(|leg| leg.is_correct);
    if won {
        let payout = bet_amount * payout_multiplier(legs.len());
        Settlement {
            won,
            payout,
            profit_loss: payout - bet_amount,
        }
    } else {
        Settlement {
            won,
            payout: 0.0,
            profit_loss: -bet_amount,
        }
    }
}
