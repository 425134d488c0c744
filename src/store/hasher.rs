//! Content hashing

use crate::model::Digest;

/// Trait for computing the content digest of a payload
///
/// Implementations must be pure: the same bytes always produce the same
/// digest, across restarts and across builds. Blobs already on disk are
/// addressed by whatever this returned when they were written.
pub trait ContentHasher: Send + Sync {
    /// Compute the digest of `payload`
    fn digest(&self, payload: &[u8]) -> Digest;

    /// Get the algorithm name
    fn name(&self) -> &str;
}

/// MD5, rendered as 32 lowercase hex characters
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5Hasher;

impl ContentHasher for Md5Hasher {
    fn digest(&self, payload: &[u8]) -> Digest {
        Digest::from_bytes(md5::compute(payload).0)
    }

    fn name(&self) -> &str {
        "md5"
    }
}
