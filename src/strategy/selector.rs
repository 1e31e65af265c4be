//! Daily leg selection.
//!
//! All of a day's oracle picks are ranked once by confidence; every
//! tested leg count then takes a prefix of that same ranking.

use crate::types::ParlayLeg;

/// One day's candidate legs, highest confidence first.
#[derive(Debug, Clone, Default)]
pub struct RankedSlate {
    legs: Vec<ParlayLeg>,
}

impl RankedSlate {
    /// Rank legs by confidence descending. The sort is stable, so equal
    /// confidences keep the order they were produced in.
    pub fn build(mut legs: Vec<ParlayLeg>) -> Self {
        legs.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self { legs }
    }

    /// The first `leg_count` legs, or `None` if the day has too few.
    pub fn select(&self, leg_count: usize) -> Option<&[ParlayLeg]> {
        if leg_count == 0 || self.legs.len() < leg_count {
            return None;
        }
        Some(&self.legs[..leg_count])
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn legs(&self) -> &[ParlayLeg] {
        &self.legs
    }
}
