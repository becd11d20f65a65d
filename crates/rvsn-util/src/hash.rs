//! Content hashing.

use sha2::{Digest, Sha256};

/// Hex encoded SHA-256 of `bytes`.
///
/// Used only to detect whether a file changed between two observations;
/// it is not a content address.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"hello world"));
    }

    #[test]
    fn test_content_hash_empty() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
