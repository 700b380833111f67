//! Conversation session state.

use flow_script::{MessageId, Sequence, SequenceId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::traversal::TraversalError;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a step stopped short. The batch produced up to that point is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowFault {
    /// The traverser hit its step cap, usually a `nextMessageId` cycle.
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    /// The target of a sequence transition could not be entered.
    #[error("transition to sequence '{target}' failed: {reason}")]
    Transition { target: SequenceId, reason: String },

    /// Sequence transitions plus auto-route hops exceeded the configured cap.
    #[error("exceeded {0} sequence transitions or route hops in one step")]
    TooManyHops(usize),
}

/// Where a conversation stands after the last step.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStatus {
    /// Stopped at an interactive message; the next call must supply input.
    AwaitingInput { message_id: MessageId },

    /// The flow has nothing more to show.
    Ended,

    /// The step stopped on a script fault. `resume_at` is a message of the
    /// current sequence to [`reset_to`](super::FlowOrchestrator::reset_to)
    /// once the script is fixed; any other known-good message works too.
    Faulted {
        error: FlowFault,
        resume_at: MessageId,
    },
}

impl FlowStatus {
    pub fn is_awaiting_input(&self) -> bool {
        matches!(self, FlowStatus::AwaitingInput { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, FlowStatus::Ended)
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, FlowStatus::Faulted { .. })
    }
}

/// The active sequence and position of one conversation.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub id: SessionId,
    pub sequence: Arc<Sequence>,
    pub status: FlowStatus,
}

impl Session {
    pub fn new(sequence: Arc<Sequence>) -> Self {
        Self {
            id: SessionId::new(),
            sequence,
            status: FlowStatus::Ended,
        }
    }

    pub fn sequence_id(&self) -> &SequenceId {
        self.sequence.id()
    }
}
