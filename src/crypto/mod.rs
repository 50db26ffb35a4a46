//! Cryptographic foundations for the commit-reveal scheme
//!
//! Two concerns live here: obtaining secure entropy for server seeds, and the
//! one-way commitment published to the player before any spin is recorded.

pub mod commitment;
pub mod entropy;

pub use commitment::{
    commitment_matches, compute_commitment, SeedPair, ServerSeed, COMMITMENT_LEN, SCHEME_VERSION,
    SERVER_SEED_LEN,
};
pub use entropy::secure_random_bytes;
