//! Messages published to viewers
//!
//! A message is built once, with its JSON body already encoded, and then
//! shared unchanged by every subscriber it is delivered to.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

/// Envelope announcing that a graph exists
pub const CREATED: &str = "__created";

/// Envelope announcing that a graph's input has ended
pub const COMPLETED: &str = "__completed";

/// Which subscribers a message is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    All,
    Only(HashSet<String>),
}

impl Recipients {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Recipients::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Recipients::All => true,
            Recipients::Only(names) => names.contains(name),
        }
    }
}

/// The body of a message could not be encoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to encode message contents: {0}")]
pub struct EncodeError(pub String);

/// An immutable, pre-encoded message
#[derive(Debug, Clone)]
pub struct Message {
    envelope: String,
    recipients: Recipients,
    contents: Result<Vec<u8>, EncodeError>,
}

/// Messages are fanned out by reference
pub type SharedMessage = Arc<Message>;

impl Message {
    pub fn new(
        envelope: impl Into<String>,
        recipients: Recipients,
        contents: Result<Vec<u8>, EncodeError>,
    ) -> Self {
        Self {
            envelope: envelope.into(),
            recipients,
            contents,
        }
    }

    /// Encode `contents` as JSON for every subscriber
    pub fn json<T: Serialize + ?Sized>(envelope: impl Into<String>, contents: &T) -> Self {
        Self::json_to(Recipients::All, envelope, contents)
    }

    /// Encode `contents` as JSON for specific subscribers
    pub fn json_to<T: Serialize + ?Sized>(
        recipients: Recipients,
        envelope: impl Into<String>,
        contents: &T,
    ) -> Self {
        let contents = serde_json::to_vec(contents).map_err(|e| EncodeError(e.to_string()));
        Self::new(envelope, recipients, contents)
    }

    pub fn envelope(&self) -> &str {
        &self.envelope
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    pub fn is_recipient(&self, name: &str) -> bool {
        self.recipients.accepts(name)
    }

    pub fn contents(&self) -> Result<&[u8], &EncodeError> {
        self.contents.as_deref()
    }
}
