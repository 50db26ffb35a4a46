//! Slot game configuration: reels, symbol weights, and the paytable
//!
//! Weights and payouts are configuration, not engine contract: the engine only
//! requires that weights are positive and that every paytable entry refers to a
//! configured symbol. Multipliers are integer hundredths of the bet so payout
//! arithmetic never touches floating point.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Payout multipliers are expressed in hundredths of the bet:
/// a multiplier of 250 pays 2.5x.
pub const MULTIPLIER_SCALE: u64 = 100;

/// A reel symbol and its selection weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolWeight {
    /// Symbol index, referenced by the paytable and by spin outcomes.
    pub symbol: u8,
    pub weight: u32,
}

/// A paytable rule: `symbol` appearing at least `count` times across the reels
/// pays `multiplier` hundredths of the bet. The highest applicable rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytableEntry {
    pub symbol: u8,
    pub count: u8,
    pub multiplier: u64,
}

/// Full configuration for one slot game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub game_id: String,
    pub reel_count: u8,
    pub symbols: Vec<SymbolWeight>,
    pub paytable: Vec<PaytableEntry>,
}

impl GameConfig {
    /// A classic 3-reel game with five weighted symbols.
    ///
    /// Roughly: cherry (common, small pay) through wild (rare, big pay).
    /// Two-of-a-kind cherries pay a consolation amount.
    pub fn classic_three_reel() -> Self {
        Self {
            game_id: "classic-three-reel".into(),
            reel_count: 3,
            symbols: vec![
                SymbolWeight { symbol: 0, weight: 40 }, // cherry
                SymbolWeight { symbol: 1, weight: 30 }, // lemon
                SymbolWeight { symbol: 2, weight: 16 }, // bell
                SymbolWeight { symbol: 3, weight: 10 }, // seven
                SymbolWeight { symbol: 4, weight: 4 },  // wild
            ],
            paytable: vec![
                PaytableEntry { symbol: 0, count: 2, multiplier: 50 },
                PaytableEntry { symbol: 0, count: 3, multiplier: 200 },
                PaytableEntry { symbol: 1, count: 3, multiplier: 300 },
                PaytableEntry { symbol: 2, count: 3, multiplier: 500 },
                PaytableEntry { symbol: 3, count: 3, multiplier: 1500 },
                PaytableEntry { symbol: 4, count: 3, multiplier: 5000 },
            ],
        }
    }

    /// Validate structural invariants before any derivation uses this config.
    pub fn validate(&self) -> Result<()> {
        if self.reel_count == 0 {
            return Err(Error::InvalidConfig("reel_count must be positive".into()));
        }
        if self.symbols.is_empty() {
            return Err(Error::InvalidConfig("no symbols configured".into()));
        }
        for sw in &self.symbols {
            if sw.weight == 0 {
                return Err(Error::InvalidConfig(format!(
                    "symbol {} has zero weight",
                    sw.symbol
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for sw in &self.symbols {
            if !seen.insert(sw.symbol) {
                return Err(Error::InvalidConfig(format!(
                    "symbol {} configured twice",
                    sw.symbol
                )));
            }
        }
        for entry in &self.paytable {
            if !seen.contains(&entry.symbol) {
                return Err(Error::InvalidConfig(format!(
                    "paytable references unknown symbol {}",
                    entry.symbol
                )));
            }
            if entry.count == 0 || entry.count > self.reel_count {
                return Err(Error::InvalidConfig(format!(
                    "paytable count {} out of range for {} reels",
                    entry.count, self.reel_count
                )));
            }
        }
        // Total weight must fit the sampler's u32 bound.
        let total: u64 = self.symbols.iter().map(|s| s.weight as u64).sum();
        if total > u32::MAX as u64 {
            return Err(Error::InvalidConfig("total symbol weight overflows u32".into()));
        }
        Ok(())
    }

    /// Sum of all symbol weights.
    pub fn total_weight(&self) -> u32 {
        self.symbols.iter().map(|s| s.weight).sum()
    }

    /// Best multiplier for `symbol` appearing `count` times, or 0.
    pub(crate) fn multiplier_for(&self, symbol: u8, count: u8) -> u64 {
        self.paytable
            .iter()
            .filter(|e| e.symbol == symbol && e.count <= count)
            .map(|e| e.multiplier)
            .max()
            .unwrap_or(0)
    }
}
