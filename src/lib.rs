//! # mailvault
//!
//! A content-addressed, collision-safe store for raw electronic mail.
//!
//! Each message's raw bytes are written once under their MD5 digest and
//! read back by `(digest, collision index)`. Metadata records keep only that
//! pair and the message size; identical messages share one file.
//!
//! ## Core Concepts
//!
//! - **Digest**: 32 lowercase hex characters derived from the exact bytes
//! - **Collision index**: `0` for the first payload seen under a digest,
//!   `1, 2, ...` for distinct payloads that happen to share it
//! - **Layout**: `<root>/<shard>/<digest>[-<k>]`, shard = first two hex chars
//! - **MailRecord**: the metadata-side adapter (`set_body` / `body`)
//!
//! ## Example
//!
//! ```no_run
//! use mailvault::{BlobStore, MailRecord};
//!
//! let store = BlobStore::new("/var/lib/mailvault/default/email");
//! let key = store.put(b"Hello")?.key;
//! assert_eq!(store.get(&key.digest, key.collision).as_deref(), Some(&b"Hello"[..]));
//!
//! let mut record = MailRecord::new("INBOX");
//! record.set_body(&store, b"From: a@example.com\r\n\r\nhi\r\n")?;
//! # Ok::<(), mailvault::Error>(())
//! ```

pub mod config;
pub mod mail;
pub mod model;
pub mod store;

mod error;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use mail::{Envelope, Flags, Header, MailRecord};
pub use model::{BlobKey, CollisionIndex, Digest};
pub use store::{BlobStore, ContentHasher, Md5Hasher, PutOutcome, StoreStats};
