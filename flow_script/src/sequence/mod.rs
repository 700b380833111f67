//! Sequences - named, immutable collections of messages keyed by id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ScriptError, ScriptResult};
use crate::messages::{Message, MessageId, SequenceId};

/// Read access to the messages of one loaded sequence.
///
/// This is all the traverser needs; how the sequence got loaded is not its
/// concern.
pub trait SequenceStore {
    /// Check whether a message with this id exists.
    fn has_message(&self, id: MessageId) -> bool;

    /// Look up a message by id.
    fn get_message_by_id(&self, id: MessageId) -> Option<&Message>;
}

/// A named, ordered set of messages forming one conversational unit.
///
/// Immutable after construction; changing a sequence means loading it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SequenceFile", into = "SequenceFile")]
pub struct Sequence {
    id: SequenceId,
    messages: HashMap<MessageId, Message>,
}

/// Authored form of a sequence: `{ "id": "...", "messages": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SequenceFile {
    id: SequenceId,
    messages: Vec<Message>,
}

impl Sequence {
    /// Build a sequence, rejecting duplicate message ids.
    pub fn from_messages(
        id: impl Into<SequenceId>,
        messages: impl IntoIterator<Item = Message>,
    ) -> ScriptResult<Self> {
        let id = id.into();
        let mut by_id = HashMap::new();
        for message in messages {
            let message_id = message.id;
            if by_id.insert(message_id, message).is_some() {
                return Err(ScriptError::DuplicateMessage {
                    sequence: id.0.clone(),
                    id: message_id,
                });
            }
        }
        if by_id.is_empty() {
            return Err(ScriptError::EmptySequence(id.0));
        }
        Ok(Self {
            id,
            messages: by_id,
        })
    }

    /// Parse a sequence from its JSON definition.
    pub fn from_json_str(json: &str) -> ScriptResult<Self> {
        let file: SequenceFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    pub fn id(&self) -> &SequenceId {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Lowest message id, the natural entry point when none is configured.
    pub fn first_message_id(&self) -> Option<MessageId> {
        self.messages.keys().min().copied()
    }

    /// All message ids in ascending order.
    pub fn message_ids(&self) -> Vec<MessageId> {
        let mut ids: Vec<_> = self.messages.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over messages in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.message_ids()
            .into_iter()
            .filter_map(move |id| self.messages.get(&id))
    }
}

impl SequenceStore for Sequence {
    fn has_message(&self, id: MessageId) -> bool {
        self.messages.contains_key(&id)
    }

    fn get_message_by_id(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }
}

impl TryFrom<SequenceFile> for Sequence {
    type Error = ScriptError;

    fn try_from(file: SequenceFile) -> Result<Self, Self::Error> {
        Self::from_messages(file.id, file.messages)
    }
}

impl From<Sequence> for SequenceFile {
    fn from(sequence: Sequence) -> Self {
        let mut messages: Vec<_> = sequence.messages.into_values().collect();
        messages.sort_by_key(|m| m.id);
        Self {
            id: sequence.id,
            messages,
        }
    }
}
