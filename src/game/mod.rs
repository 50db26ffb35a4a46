//! Game configuration and deterministic outcome generation
//!
//! `config` declares the reels, symbol weights, and paytable for a game;
//! `derive` turns seed material and a nonce into an entropy stream and selects
//! symbols against those weights; `outcome` is the closed result type with its
//! integer payout arithmetic.

pub mod config;
pub mod derive;
pub mod outcome;

pub use config::{GameConfig, PaytableEntry, SymbolWeight, MULTIPLIER_SCALE};
pub use derive::{derive_outcome, OutcomeStream};
pub use outcome::{Outcome, SlotOutcome};
