//! Salted SHA-256 password digests.
//!
//! Digest = base64(SHA-256(password bytes ‖ salt bytes)) with a fresh
//! 16-byte salt per credential, matching the stored `users` columns.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::constant_time_eq;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// A digest/salt pair ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    /// Base64 digest.
    pub hash: String,
    /// Base64 salt.
    pub salt: String,
}

impl HashedPassword {
    /// Hash `password` under a freshly generated salt.
    pub fn new(password: &str) -> Self {
        let salt = generate_salt();
        Self {
            hash: digest(password, &salt),
            salt: STANDARD.encode(salt),
        }
    }
}

/// Generate 16 random salt bytes from the thread-local CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Base64 SHA-256 of `password ‖ salt`.
pub fn digest(password: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    STANDARD.encode(hasher.finalize())
}

/// Verify `password` against a stored base64 digest and base64 salt.
///
/// An undecodable salt never verifies.
pub fn verify_password(password: &str, stored_hash: &str, stored_salt: &str) -> bool {
    let Ok(salt) = STANDARD.decode(stored_salt) else {
        return false;
    };
    let computed = digest(password, &salt);
    constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let hashed = HashedPassword::new("123456");
        assert!(verify_password("123456", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hashed = HashedPassword::new("123456");
        assert!(!verify_password("1234567", &hashed.hash, &hashed.salt));
        assert!(!verify_password("", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn regenerated_pair_still_verifies_only_the_right_password() {
        let first = HashedPassword::new("s3cret");
        let second = HashedPassword::new("s3cret");
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
        assert!(verify_password("s3cret", &second.hash, &second.salt));
        assert!(!verify_password("s3cret", &first.hash, &second.salt));
    }

    #[test]
    fn salts_differ_between_calls() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn digest_is_sha256_of_password_then_salt() {
        let salt = [7u8; SALT_LEN];
        let mut combined = b"admin".to_vec();
        combined.extend_from_slice(&salt);
        let expected = STANDARD.encode(Sha256::digest(&combined));
        assert_eq!(digest("admin", &salt), expected);
        // 32-byte digest is 44 base64 chars, 16-byte salt is 24.
        assert_eq!(expected.len(), 44);
        assert_eq!(STANDARD.encode(salt).len(), 24);
    }

    #[test]
    fn bad_salt_never_verifies() {
        let hashed = HashedPassword::new("pw");
        assert!(!verify_password("pw", &hashed.hash, "not base64!!"));
    }
}
