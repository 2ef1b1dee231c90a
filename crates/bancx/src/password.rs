//! Argon2id password hashing.
//!
//! Parameters are pinned in [`crate::constants`] so that hashes written by
//! one tool (for example a seed script) verify against any other component
//! of the system. The output is a PHC-format string carrying algorithm,
//! parameters, salt and digest.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::constants::{
    ARGON2_HASH_LEN, ARGON2_MEMORY_COST, ARGON2_PARALLELISM, ARGON2_TIME_COST,
};
use crate::error::ProtocolError;

fn hasher() -> Result<Argon2<'static>, ProtocolError> {
    let params = Params::new(
        ARGON2_MEMORY_COST,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(ARGON2_HASH_LEN),
    )
    .map_err(|e| ProtocolError::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// `SaltString::generate` draws the recommended 16-byte salt, matching
/// [`crate::constants::ARGON2_SALT_LEN`].
pub fn hash_password(plain: &str) -> Result<String, ProtocolError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| ProtocolError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash string.
///
/// Returns `false` both on mismatch and when the stored hash does not parse;
/// callers treat every failure identically.
pub fn verify_password(stored: &str, plain: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    // Parameters come from the hash string itself, so a default context
    // verifies hashes produced with the pinned parameters.
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Correct_pass1!").unwrap();
        assert!(verify_password(&hash, "Correct_pass1!"));
        assert!(!verify_password(&hash, "Wrong_pass1!"));
    }

    #[test]
    fn hash_carries_pinned_parameters() {
        let hash = hash_password("Correct_pass1!").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Correct_pass1!").unwrap();
        let b = hash_password("Correct_pass1!").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&b, "Correct_pass1!"));
    }

    #[test]
    fn garbage_stored_hash_is_a_mismatch() {
        assert!(!verify_password("no-es-un-hash", "Correct_pass1!"));
        assert!(!verify_password("", "Correct_pass1!"));
    }
}
