//! Stateless spin verification
//!
//! Runs on publicly available data after reveal: recompute the commitment
//! from the revealed seed, then recompute the outcome from the same inputs
//! the engine used. Both checks must pass; each failure is reported with its
//! own reason so a dispute can tell a broken commitment apart from a
//! misreported outcome.

use crate::crypto::{commitment_matches, ServerSeed, COMMITMENT_LEN, SCHEME_VERSION};
use crate::engine::SeedReveal;
use crate::error::{Error, Result};
use crate::game::{derive_outcome, GameConfig, Outcome};
use crate::session::SpinRecord;

/// Why a spin failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    /// The revealed seed does not hash to the published commitment: the
    /// server did not commit to this seed before play.
    CommitmentMismatch,
    /// The recomputed outcome differs from the claimed one: the paid result
    /// does not follow from the committed seed material.
    OutcomeMismatch,
}

impl std::fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommitmentMismatch => f.write_str("commitment mismatch"),
            Self::OutcomeMismatch => f.write_str("outcome mismatch"),
        }
    }
}

/// Verdict of one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    pub fair: bool,
    pub reason: Option<VerifyFailure>,
}

impl VerifyReport {
    fn fair() -> Self {
        Self {
            fair: true,
            reason: None,
        }
    }

    fn unfair(reason: VerifyFailure) -> Self {
        Self {
            fair: false,
            reason: Some(reason),
        }
    }
}

/// Verify one spin from raw revealed material.
///
/// Pure and lock-free; safe to run anywhere, including client-side.
pub fn verify_spin(
    server_seed: &[u8],
    server_seed_hash: &[u8; COMMITMENT_LEN],
    client_seed: &str,
    nonce: u64,
    claimed: &Outcome,
    config: &GameConfig,
) -> Result<VerifyReport> {
    if !commitment_matches(server_seed_hash, server_seed) {
        return Ok(VerifyReport::unfair(VerifyFailure::CommitmentMismatch));
    }

    let seed = ServerSeed::from_bytes(server_seed)?;
    let recomputed = derive_outcome(&seed, client_seed, nonce, config)?;
    if &recomputed != claimed {
        return Ok(VerifyReport::unfair(VerifyFailure::OutcomeMismatch));
    }

    Ok(VerifyReport::fair())
}

/// Verify a recorded spin against a session's reveal payload.
///
/// Rejects reveals from a scheme version this verifier does not implement
/// rather than misreporting them as unfair.
pub fn verify_record(
    reveal: &SeedReveal,
    record: &SpinRecord,
    config: &GameConfig,
) -> Result<VerifyReport> {
    if reveal.scheme_version != SCHEME_VERSION {
        return Err(Error::InvalidState(format!(
            "unsupported scheme version {}",
            reveal.scheme_version
        )));
    }
    let seed_bytes = hex::decode(&reveal.server_seed)
        .map_err(|e| Error::InvalidState(format!("invalid seed hex: {e}")))?;
    let hash_bytes = hex::decode(&reveal.server_seed_hash)
        .map_err(|e| Error::InvalidState(format!("invalid commitment hex: {e}")))?;
    let hash: [u8; COMMITMENT_LEN] = hash_bytes.as_slice().try_into().map_err(|_| {
        Error::InvalidState(format!(
            "commitment must be {COMMITMENT_LEN} bytes, got {}",
            hash_bytes.len()
        ))
    })?;

    verify_spin(
        &seed_bytes,
        &hash,
        &reveal.client_seed,
        record.nonce,
        &record.outcome,
        config,
    )
}
