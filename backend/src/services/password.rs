//! Salted password hashing for user accounts.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SEPARATOR: char = '$';

/// Hash a plaintext password with a fresh random salt.
///
/// # Returns
/// `salt$digest`, where `digest` is the hex-encoded SHA-256 of the salt and
/// the password.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, password);
    format!("{}{}{}", salt, SEPARATOR, digest)
}

/// Check a plaintext password against a value produced by [`hash_password`].
///
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    let actual = salted_digest(salt, password);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([SEPARATOR as u8]);
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_same_password_different_salt() {
        let first = hash_password("secret-pass");
        let second = hash_password("secret-pass");
        assert_ne!(first, second);
        assert!(verify_password("secret-pass", &first));
        assert!(verify_password("secret-pass", &second));
    }

    #[test]
    fn test_malformed_stored_value() {
        assert!(!verify_password("anything", "no-separator-here"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_truncated_digest_never_verifies() {
        let stored = hash_password("correct horse");
        let truncated = &stored[..stored.len() - 1];
        assert!(!verify_password("correct horse", truncated));
        assert!(!verify_password("correct horse", &format!("{}0", stored)));
    }
}
