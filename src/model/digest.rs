//! 128-bit content digest rendered as lowercase hex

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of raw bytes in a digest
pub const DIGEST_LEN: usize = 16;

/// Number of hex characters in a rendered digest
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// A 16-byte content digest used for addressing stored blobs
///
/// On disk and on the wire a digest is always its 32-character lowercase hex
/// form; data already written depends on that rendering staying stable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Create a digest from raw bytes
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Convert to lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 32-character hex string
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        if s.len() != DIGEST_HEX_LEN {
            return Err(crate::Error::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                DIGEST_HEX_LEN,
                s.len()
            )));
        }
        let mut arr = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut arr)
            .map_err(|e| crate::Error::InvalidDigest(format!("{}: {}", s, e)))?;
        Ok(Digest(arr))
    }

    /// Shard directory name: the first two hex characters
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Short prefix for display
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl std::str::FromStr for Digest {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Digest::from_hex(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = crate::Error;

    fn try_from(s: String) -> crate::Result<Self> {
        Digest::from_hex(&s)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.to_hex()
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
