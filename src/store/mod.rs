//! Content-addressed blob store
//!
//! Payloads are stored once per distinct content under a digest-derived
//! path, with collision slots for distinct payloads sharing a digest.

mod blob_store;
mod hasher;

pub use blob_store::{BlobStore, PutOutcome, StoreStats};
pub use hasher::{ContentHasher, Md5Hasher};
