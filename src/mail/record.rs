//! Mail record: metadata plus a reference to the stored raw message

use super::envelope::{self, Envelope, Header};
use crate::model::{BlobKey, CollisionIndex, Digest};
use crate::store::BlobStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// IMAP-style message flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    pub seen: bool,
    pub answered: bool,
    pub flagged: bool,
    pub draft: bool,
    pub recent: bool,
}

/// One electronic mail as seen by the metadata layer
///
/// The raw message never lives on the record itself; only the
/// `(digest, collision)` pair pointing into a [`BlobStore`] and the derived
/// byte size are kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MailRecord {
    /// Owning mailbox name
    pub mailbox: Option<String>,

    #[serde(flatten)]
    pub envelope: Envelope,

    /// All top-level headers, in message order
    #[serde(default)]
    pub headers: Vec<Header>,

    #[serde(default)]
    pub flags: Flags,

    digest: Option<Digest>,

    #[serde(default)]
    collision: CollisionIndex,

    /// Derived from the body by `set_body`. Deserialized values are taken
    /// as-is; [`verify_body`](MailRecord::verify_body) checks them.
    #[serde(default)]
    size: u64,
}

impl MailRecord {
    /// Create an empty record in a mailbox
    pub fn new(mailbox: impl Into<String>) -> Self {
        MailRecord {
            mailbox: Some(mailbox.into()),
            ..Default::default()
        }
    }

    /// Build a record from a raw message: envelope fields, headers, then body
    pub fn from_message(store: &BlobStore, mailbox: impl Into<String>, raw: &[u8]) -> Result<Self> {
        let parsed = envelope::parse(raw)?;
        let mut record = MailRecord::new(mailbox);
        record.envelope = parsed.envelope;
        record.headers = parsed.headers;
        record.set_body(store, raw)?;
        Ok(record)
    }

    /// Store the raw message and point this record at it.
    ///
    /// An empty body is a no-op: a record may exist before its body does.
    pub fn set_body(&mut self, store: &BlobStore, raw: &[u8]) -> Result<()> {
        if raw.is_empty() {
            return Ok(());
        }
        let outcome = store.put(raw)?;
        self.digest = Some(outcome.key.digest);
        self.collision = outcome.key.collision;
        self.size = raw.len() as u64;
        Ok(())
    }

    /// Read the raw message back; `None` if no body was set or it is unreadable
    pub fn body(&self, store: &BlobStore) -> Option<Vec<u8>> {
        let digest = self.digest.as_ref()?;
        store.get(digest, self.collision)
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    pub fn collision(&self) -> CollisionIndex {
        self.collision
    }

    /// Byte length of the stored raw message
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check the record against its stored body.
    ///
    /// The blob must exist and hash to the recorded digest, and its length
    /// must equal the recorded size. A record without a body must have size 0.
    pub fn verify_body(&self, store: &BlobStore) -> Result<()> {
        let Some(key) = self.body_key() else {
            if self.size != 0 {
                return Err(Error::SizeMismatch {
                    key: "(no body)".into(),
                    recorded: self.size,
                    stored: 0,
                });
            }
            return Ok(());
        };
        store.verify(&key)?;
        let stored = std::fs::metadata(store.path_for(&key))?.len();
        if stored != self.size {
            return Err(Error::SizeMismatch {
                key: key.to_string(),
                recorded: self.size,
                stored,
            });
        }
        Ok(())
    }

    /// Key of the stored body, if any
    pub fn body_key(&self) -> Option<BlobKey> {
        self.digest.map(|d| BlobKey::new(d, self.collision))
    }
}
