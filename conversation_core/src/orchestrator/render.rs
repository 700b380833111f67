//! Display-ready output of one orchestrator step.

use flow_script::{MessageId, Sender, SequenceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FlowStatus;

/// How a rendered message should be presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderedKind {
    Text,
    Choice { options: Vec<String> },
    TextInput { hint: Option<String> },
}

/// A message with placeholders filled and content resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMessage {
    pub id: MessageId,
    pub sequence_id: SequenceId,
    pub sender: Sender,
    pub text: String,
    pub kind: RenderedKind,
}

/// A side effect requested by a `trigger` data action, for the host to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEvent {
    pub message_id: MessageId,
    pub sequence_id: SequenceId,
    pub event: String,
    pub payload: Value,
}

/// Everything produced by one orchestrator step.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBatch {
    /// Messages to display, in order.
    pub messages: Vec<RenderedMessage>,
    /// Triggered side effects, in the order their actions ran.
    pub events: Vec<FlowEvent>,
    pub status: FlowStatus,
}

impl RenderedBatch {
    pub(crate) fn new() -> Self {
        Self {
            messages: Vec::new(),
            events: Vec::new(),
            status: FlowStatus::Ended,
        }
    }

    /// Texts of all messages, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }
}
