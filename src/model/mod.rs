//! Core data model types for mailvault

mod digest;
mod key;

pub use digest::{Digest, DIGEST_HEX_LEN, DIGEST_LEN};
pub use key::{BlobKey, CollisionIndex};
