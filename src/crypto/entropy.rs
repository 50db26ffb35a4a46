//! Secure entropy source for server seed generation
//!
//! Thin fallible wrapper over the operating system RNG. A failure here must
//! never be papered over with a weaker source; it surfaces as
//! `Error::EntropyUnavailable` and the commitment is not opened.

use crate::error::{Error, Result};

/// Fill `buf` with cryptographically strong random bytes from the OS.
pub fn secure_random_bytes(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf).map_err(|e| Error::EntropyUnavailable(e.to_string()))
}
