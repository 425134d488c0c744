//! Blob keys and their on-disk names

use super::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Disambiguates distinct payloads that share a digest.
///
/// `0` is the first payload seen for a digest; later distinct payloads get
/// `1, 2, 3, ...` in first-seen order.
pub type CollisionIndex = u32;

/// Identifies exactly one stored blob
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobKey {
    pub digest: Digest,
    pub collision: CollisionIndex,
}

impl BlobKey {
    pub fn new(digest: Digest, collision: CollisionIndex) -> Self {
        BlobKey { digest, collision }
    }

    /// The canonical (first-seen) slot for a digest
    pub fn canonical(digest: Digest) -> Self {
        BlobKey {
            digest,
            collision: 0,
        }
    }

    /// `<digest>` for the canonical slot, `<digest>-<k>` otherwise
    pub fn file_name(&self) -> String {
        if self.collision == 0 {
            self.digest.to_hex()
        } else {
            format!("{}-{}", self.digest.to_hex(), self.collision)
        }
    }

    /// `<shard>/<file_name>`, relative to a store root
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.digest.shard()).join(self.file_name())
    }

    /// Inverse of [`file_name`](BlobKey::file_name).
    ///
    /// Returns `None` for anything that is not a blob name, including the
    /// temporary files writers leave while publishing and `<digest>-0`.
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let (hex, collision) = match name.split_once('-') {
            Some((hex, suffix)) => {
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let k: CollisionIndex = suffix.parse().ok()?;
                if k == 0 || suffix.starts_with('0') {
                    return None;
                }
                (hex, k)
            }
            None => (name, 0),
        };
        if hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let digest = Digest::from_hex(hex).ok()?;
        Some(BlobKey { digest, collision })
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
