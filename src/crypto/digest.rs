//! One-way digests for passwords and passkeys
//!
//! Unsalted SHA-256 rendered as lowercase hex, the form stored in existing
//! data files.

use sha2::{Digest, Sha256};

/// Hash a secret with SHA-256 and return the lowercase hex digest
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a secret against a stored hex digest
pub fn verify_secret(secret: &str, expected_hash: &str) -> bool {
    hash_secret(secret).eq_ignore_ascii_case(expected_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_secret("admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_secret("abc123"), hash_secret("abc123"));
        assert_ne!(hash_secret("abc123"), hash_secret("abc124"));
    }

    #[test]
    fn test_verify() {
        let stored = hash_secret("password1");
        assert!(verify_secret("password1", &stored));
        assert!(verify_secret("password1", &stored.to_uppercase()));
        assert!(!verify_secret("password2", &stored));
    }
}
