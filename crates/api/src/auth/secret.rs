//! Secret hashing and constant-time verification

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a secret for storage. SHA-256 hex; the digest is the only form
/// that is ever persisted or compared.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a candidate secret against a stored digest.
/// Hashing the candidate first fixes the compared lengths, and the final
/// comparison is constant-time, so timing reveals nothing about where the
/// two digests diverge.
pub fn verify_secret(digest: &str, candidate: &str) -> bool {
    constant_time_compare(digest, &hash_secret(candidate))
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        // Do a dummy comparison to avoid length-based timing attacks
        let dummy = vec![0u8; a.len()];
        let _ = a.as_bytes().ct_eq(&dummy);
        return false;
    }

    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_hex() {
        let digest = hash_secret("hunter2");
        assert_eq!(digest, hash_secret("hunter2"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_accepts_correct_secret() {
        let digest = hash_secret("correct horse battery staple");
        assert!(verify_secret(&digest, "correct horse battery staple"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let digest = hash_secret("secret-a");
        assert!(!verify_secret(&digest, "secret-b"));
        // Same length as the right secret, still rejected
        assert!(!verify_secret(&digest, "secret-c"));
        assert!(!verify_secret(&digest, ""));
    }

    #[test]
    fn test_verify_rejects_digest_as_candidate() {
        // Presenting the stored digest itself must not authenticate
        let digest = hash_secret("secret");
        assert!(!verify_secret(&digest, &digest));
    }

    #[test]
    fn test_compare_handles_unequal_lengths() {
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(!constant_time_compare("", "x"));
        assert!(constant_time_compare("", ""));
    }
}
