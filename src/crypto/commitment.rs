//! Seed commitment management
//!
//! The server commits to its secret seed before any spin by publishing
//! `SHA-256(server_seed)`. The raw seed stays inside the engine until the
//! session ends, at which point it is revealed exactly once so anyone can
//! recompute the hash and every outcome derived under it.
//!
//! The hash function and seed length are fixed per `SCHEME_VERSION`; the
//! version tag travels with every seed pair so a future scheme change cannot
//! silently invalidate in-flight sessions' verifiability.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

use super::entropy::secure_random_bytes;

/// Length of the server seed in bytes.
pub const SERVER_SEED_LEN: usize = 32;

/// Length of the published commitment digest in bytes.
pub const COMMITMENT_LEN: usize = 32;

/// Version tag for the commitment scheme (hash function + seed length).
pub const SCHEME_VERSION: u8 = 1;

/// Server-side secret seed material.
///
/// Zeroized on drop and redacted in debug output. Never serialized; the only
/// way it leaves the engine is through an explicit reveal on an ended session.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ServerSeed([u8; SERVER_SEED_LEN]);

impl ServerSeed {
    /// Generate a fresh seed from the OS entropy source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SERVER_SEED_LEN];
        secure_random_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Reconstruct a seed from revealed bytes (verifier side).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SERVER_SEED_LEN] = bytes
            .try_into()
            .map_err(|_| Error::InvalidState(format!("server seed must be {SERVER_SEED_LEN} bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }

    /// Reconstruct a seed from its revealed hex form.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s).map_err(|e| Error::InvalidState(format!("invalid seed hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SERVER_SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The one-way commitment to this seed.
    pub fn commitment(&self) -> [u8; COMMITMENT_LEN] {
        compute_commitment(&self.0)
    }
}

impl std::fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ServerSeed(<redacted>)")
    }
}

/// Compute the commitment digest for raw seed bytes.
pub fn compute_commitment(seed: &[u8]) -> [u8; COMMITMENT_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    let digest = hasher.finalize();
    let mut out = [0u8; COMMITMENT_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Constant-time check that `commitment` is the digest of `seed`.
pub fn commitment_matches(commitment: &[u8; COMMITMENT_LEN], seed: &[u8]) -> bool {
    compute_commitment(seed).ct_eq(commitment).into()
}

/// A seed pair: server secret, its published commitment, and the
/// player-visible client seed.
///
/// Created when a session opens and read-only for the life of the session.
#[derive(Debug, Clone)]
pub struct SeedPair {
    server_seed: ServerSeed,
    server_seed_hash: [u8; COMMITMENT_LEN],
    client_seed: String,
    scheme_version: u8,
}

impl SeedPair {
    /// Open a new commitment: generate the secret and compute its digest.
    ///
    /// Fails with `EntropyUnavailable` if the OS RNG cannot be read.
    pub fn open(client_seed: impl Into<String>) -> Result<Self> {
        let server_seed = ServerSeed::generate()?;
        let server_seed_hash = server_seed.commitment();
        Ok(Self {
            server_seed,
            server_seed_hash,
            client_seed: client_seed.into(),
            scheme_version: SCHEME_VERSION,
        })
    }

    /// The published commitment.
    pub fn server_seed_hash(&self) -> &[u8; COMMITMENT_LEN] {
        &self.server_seed_hash
    }

    pub fn server_seed_hash_hex(&self) -> String {
        hex::encode(self.server_seed_hash)
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn scheme_version(&self) -> u8 {
        self.scheme_version
    }

    /// Engine-internal access to the secret. Callers outside the crate only
    /// ever see the seed through an explicit reveal.
    pub(crate) fn server_seed(&self) -> &ServerSeed {
        &self.server_seed
    }
}
