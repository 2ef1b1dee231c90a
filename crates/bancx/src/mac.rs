//! HMAC-SHA256 authentication for protocol envelopes.
//!
//! The tag covers the payload concatenated with the nonce, so truncating or
//! swapping either one is detected. All comparisons run in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::MAC_SIZE;
use crate::security::ct_equal;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over `mensaje` followed by `nonce`.
pub fn compute_mac(key: &[u8], mensaje: &[u8], nonce: &[u8]) -> [u8; MAC_SIZE] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(mensaje);
    mac.update(nonce);
    mac.finalize().into_bytes().into()
}

/// Verify a received tag against `mensaje` and `nonce`.
///
/// The expected MAC is always computed before the comparison, and the
/// comparison itself is [`ct_equal`], so neither a bad tag length nor an
/// early byte mismatch changes the timing profile.
pub fn verify_mac(key: &[u8], mensaje: &[u8], nonce: &[u8], tag: &[u8]) -> bool {
    let expected = compute_mac(key, mensaje, nonce);
    ct_equal(&expected, tag)
}
