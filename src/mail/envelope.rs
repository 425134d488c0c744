//! Envelope and header extraction from raw RFC 5322 messages

use crate::{Error, Result};
use mail_parser::MessageParser;
use serde::{Deserialize, Serialize};

/// One header field, kept as opaque strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Envelope fields lifted out of a message's headers
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: Option<String>,
    pub sender: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    /// Unix seconds, from the Date header
    pub date: Option<i64>,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
}

/// Parsed header block of a message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub envelope: Envelope,
    /// Every top-level header in message order
    pub headers: Vec<Header>,
}

/// Parse the top-level headers of a raw message.
///
/// Header values are unfolded and trimmed but otherwise left as written;
/// addresses are not normalised. When a header repeats, the envelope takes
/// the first occurrence while `headers` keeps all of them.
pub fn parse(raw: &[u8]) -> Result<ParsedMessage> {
    if raw.is_empty() {
        return Err(Error::Parse("empty message".into()));
    }
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| Error::Parse("not an RFC 5322 message".into()))?;

    let mut parsed = ParsedMessage::default();
    for (name, value) in message.headers_raw() {
        let value = unfold(value);
        let env = &mut parsed.envelope;
        let slot = match name.to_ascii_lowercase().as_str() {
            "from" => Some(&mut env.from),
            "sender" => Some(&mut env.sender),
            "to" => Some(&mut env.to),
            "cc" => Some(&mut env.cc),
            "bcc" => Some(&mut env.bcc),
            "subject" => Some(&mut env.subject),
            "message-id" => Some(&mut env.message_id),
            "in-reply-to" => Some(&mut env.in_reply_to),
            _ => None,
        };
        if let Some(slot) = slot {
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        }
        parsed.headers.push(Header::new(name, value));
    }
    parsed.envelope.date = message.date().map(|d| d.to_timestamp());

    Ok(parsed)
}

/// Join folded continuation lines and trim surrounding whitespace
fn unfold(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
