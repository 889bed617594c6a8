//! Password hashing for file access gates.
//!
//! Uses Argon2id PHC strings. The original stored and compared plaintext
//! passwords; hashing here is a deliberate hardening, and verification is
//! constant-time by construction.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::{ByshareError, Result};

/// Hash an access password into a PHC-formatted string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ByshareError::Storage(format!("password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a candidate password against a stored hash.
///
/// An unparseable stored hash verifies as false rather than erroring; a
/// reader should never see an internal failure on the password path.
pub fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "s3cret"));
        assert!(!verify_password(&hash, "wrong"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_stored_hash_verifies_false() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }
}
