//! Nonce generation.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::NONCE_SIZE;

/// Draw a fresh 32-byte nonce from the operating system CSPRNG.
///
/// Uniqueness is not tracked here; the server enforces single use by
/// admitting each nonce into its store at most once.
pub fn make_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
