//! Message definitions for scripted sequences.

mod message;

pub use message::*;

use serde::{Deserialize, Serialize};

/// Identifier of a message, unique within its sequence.
///
/// Ids are positive and not necessarily contiguous, but traversal falls back
/// to the next sequential id when a message names no explicit successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u32);

impl MessageId {
    /// Create a message ID from a raw integer.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// The sequential successor, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<u32> for MessageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a sequence (e.g. `"onboarding"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(pub String);

impl SequenceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SequenceId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a message is attributed to when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    #[default]
    Bot,
    User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_next() {
        assert_eq!(MessageId(4).next(), Some(MessageId(5)));
        assert_eq!(MessageId(u32::MAX).next(), None);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&MessageId(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&SequenceId::new("welcome")).unwrap(),
            "\"welcome\""
        );
    }
}
