//! Constant-time comparison.

use subtle::ConstantTimeEq;

/// Compare two byte strings in constant time with respect to their content.
///
/// Lengths are compared first; they are public in this protocol, where MACs
/// and nonces are fixed-width. For equal lengths every byte is folded into
/// the verdict through `subtle`, so the cost does not depend on where the
/// inputs differ. This backs [`crate::mac::verify_mac`].
pub fn ct_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
