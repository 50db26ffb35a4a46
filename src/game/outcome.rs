//! Spin outcome types and payout arithmetic
//!
//! `Outcome` is a closed sum over the game types the platform supports; each
//! variant carries exactly the fields its payout rule needs. All monetary math
//! is integer minor-units with a `u128` intermediate, never floating point.

use serde::{Deserialize, Serialize};

use super::config::MULTIPLIER_SCALE;

/// Result of one slot spin: the symbol landed on each reel and the matched
/// paytable multiplier (hundredths of the bet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOutcome {
    pub symbols: Vec<u8>,
    pub multiplier: u64,
}

/// Deterministic result of one spin, tagged by game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum Outcome {
    Slots(SlotOutcome),
}

impl Outcome {
    /// Matched payout multiplier in hundredths of the bet.
    pub fn multiplier(&self) -> u64 {
        match self {
            Outcome::Slots(slot) => slot.multiplier,
        }
    }

    /// Win amount in minor units for a given bet.
    ///
    /// `bet * multiplier / 100` with the product widened to `u128`; a result
    /// beyond `u64::MAX` saturates rather than wrapping.
    pub fn payout(&self, bet_amount: u64) -> u64 {
        let win = bet_amount as u128 * self.multiplier() as u128 / MULTIPLIER_SCALE as u128;
        u64::try_from(win).unwrap_or(u64::MAX)
    }
}
