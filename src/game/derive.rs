//! Deterministic outcome derivation from seed material
//!
//! Provably-fair construction: the entropy stream is HMAC-SHA256 keyed with
//! the secret server seed over `"{client_seed}:{nonce}"`, extended one block at
//! a time by appending an increasing counter to the message (hash-stream
//! expansion; no byte is ever reused). Identical inputs produce identical
//! outcomes on any machine, which is what makes after-the-fact verification
//! possible.
//!
//! Raw entropy is mapped to weighted symbols with rejection sampling so the
//! selection distribution exactly matches the configured weights; a naive
//! modulo would skew low-weight symbols whenever the total weight does not
//! divide 2^32.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::crypto::ServerSeed;
use crate::error::Result;

use super::config::{GameConfig, SymbolWeight};
use super::outcome::{Outcome, SlotOutcome};

type HmacSha256 = Hmac<Sha256>;

const BLOCK_LEN: usize = 32;

/// A deterministic stream of uniform entropy derived from one
/// `(server_seed, client_seed, nonce)` triple.
///
/// Block `i` of the stream is `HMAC-SHA256(server_seed, "{client}:{nonce}:{i}")`;
/// bytes are consumed left to right.
pub struct OutcomeStream<'a> {
    seed: &'a ServerSeed,
    message: String,
    counter: u32,
    block: [u8; BLOCK_LEN],
    offset: usize,
}

impl<'a> OutcomeStream<'a> {
    pub fn new(seed: &'a ServerSeed, client_seed: &str, nonce: u64) -> Self {
        Self {
            seed,
            message: format!("{client_seed}:{nonce}"),
            counter: 0,
            block: [0u8; BLOCK_LEN],
            // Empty buffer; first draw triggers block 0.
            offset: BLOCK_LEN,
        }
    }

    fn refill(&mut self) {
        let mut mac = HmacSha256::new_from_slice(self.seed.as_bytes())
            .expect("HMAC-SHA256 accepts any key length");
        mac.update(self.message.as_bytes());
        mac.update(b":");
        mac.update(self.counter.to_string().as_bytes());
        self.block.copy_from_slice(&mac.finalize().into_bytes());
        self.counter += 1;
        self.offset = 0;
    }

    /// Next 4 stream bytes as a big-endian u32.
    pub fn next_u32(&mut self) -> u32 {
        if self.offset + 4 > BLOCK_LEN {
            self.refill();
        }
        let chunk = &self.block[self.offset..self.offset + 4];
        self.offset += 4;
        u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
    }

    /// Uniform value in `[0, bound)` via rejection sampling.
    ///
    /// Values at or above the largest multiple of `bound` are discarded and
    /// redrawn, so every residue is equally likely.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        let threshold = u32::MAX - (u32::MAX % bound);
        loop {
            let value = self.next_u32();
            if value < threshold {
                return value % bound;
            }
        }
    }

    /// Select one symbol according to its configured weight.
    pub fn pick_weighted(&mut self, symbols: &[SymbolWeight]) -> u8 {
        let total: u32 = symbols.iter().map(|s| s.weight).sum();
        let mut roll = self.next_below(total);
        for sw in symbols {
            if roll < sw.weight {
                return sw.symbol;
            }
            roll -= sw.weight;
        }
        // Unreachable: roll < total and the weights sum to total.
        symbols[symbols.len() - 1].symbol
    }
}

/// Derive the outcome for one spin. Pure: no side effects, no hidden state.
pub fn derive_outcome(
    server_seed: &ServerSeed,
    client_seed: &str,
    nonce: u64,
    config: &GameConfig,
) -> Result<Outcome> {
    config.validate()?;

    let mut stream = OutcomeStream::new(server_seed, client_seed, nonce);
    let symbols: Vec<u8> = (0..config.reel_count)
        .map(|_| stream.pick_weighted(&config.symbols))
        .collect();

    let multiplier = best_multiplier(&symbols, config);
    Ok(Outcome::Slots(SlotOutcome { symbols, multiplier }))
}

/// Highest paytable multiplier matched by the landed symbols.
fn best_multiplier(symbols: &[u8], config: &GameConfig) -> u64 {
    let mut counts = std::collections::HashMap::new();
    for &symbol in symbols {
        *counts.entry(symbol).or_insert(0u8) += 1;
    }
    counts
        .iter()
        .map(|(&symbol, &count)| config.multiplier_for(symbol, count))
        .max()
        .unwrap_or(0)
}
