//! Mail records backed by the blob store

pub mod envelope;
mod record;

pub use envelope::{Envelope, Header, ParsedMessage};
pub use record::{Flags, MailRecord};
