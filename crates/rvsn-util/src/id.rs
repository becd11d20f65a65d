//! Commit identifier generation.
//!
//! Commit ids are the first [`COMMIT_ID_LEN`] characters of a random
//! shuffle of the SHA-256 hex digest of the commit's Unix timestamp.
//! Nothing guarantees uniqueness: two commits made within the same second
//! draw from the same digest and may collide. Callers must check a fresh id
//! against the commit log.

use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a generated commit id.
pub const COMMIT_ID_LEN: usize = 10;

/// Generate a commit id for the given Unix timestamp (seconds).
pub fn commit_id(timestamp: i64) -> String {
    commit_id_with_rng(timestamp, &mut rand::thread_rng())
}

/// Generate a commit id using the supplied random source.
pub fn commit_id_with_rng<R: Rng + ?Sized>(timestamp: i64, rng: &mut R) -> String {
    let digest = format!("{:x}", Sha256::digest(timestamp.to_string().as_bytes()));
    let mut chars: Vec<char> = digest.chars().collect();
    chars.shuffle(rng);
    chars.into_iter().take(COMMIT_ID_LEN).collect()
}
