//! Output of one traversal call.

use flow_script::{DataAction, Message, MessageId, MessageKind, SequenceId};
use thiserror::Error;

/// Configuration faults detected while walking a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("traversal from message {start} exceeded {steps} steps; the sequence likely contains a nextMessageId cycle")]
    DepthExceeded { start: MessageId, steps: usize },
}

/// Why a traversal call stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The last collected message needs external input (a choice, a text
    /// input, or an auto route). Resume from `next_message_id`, which is that
    /// same message.
    InteractiveMessage { next_message_id: MessageId },

    /// The last collected message hands off to another sequence.
    SequenceTransition { target_sequence_id: SequenceId },

    /// No further message exists.
    EndOfSequence,

    /// The walk was aborted; `messages` holds what was collected before.
    Error(TraversalError),
}

/// Messages collected by one traversal call plus the reason it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalResult {
    /// Visited messages in visitation order. Never absent; possibly empty.
    pub messages: Vec<Message>,
    pub stop_reason: StopReason,
}

impl TraversalResult {
    pub fn new(messages: Vec<Message>, stop_reason: StopReason) -> Self {
        Self {
            messages,
            stop_reason,
        }
    }

    /// The message id to resume from after an interactive stop.
    pub fn resume_at(&self) -> Option<MessageId> {
        match self.stop_reason {
            StopReason::InteractiveMessage { next_message_id } => Some(next_message_id),
            _ => None,
        }
    }

    /// The sequence to switch to after a transition stop.
    pub fn target_sequence(&self) -> Option<&SequenceId> {
        match &self.stop_reason {
            StopReason::SequenceTransition { target_sequence_id } => Some(target_sequence_id),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.stop_reason, StopReason::Error(_))
    }

    /// The message traversal stopped at, if it stopped on one.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Data actions among the collected messages, in visitation order.
    pub fn data_actions(&self) -> impl Iterator<Item = (&Message, &DataAction)> {
        self.messages.iter().filter_map(|m| match &m.kind {
            MessageKind::DataAction(action) => Some((m, action)),
            _ => None,
        })
    }
}
