//! Orchestrator-level errors.

use flow_script::{MessageId, ScriptError, SequenceId};
use thiserror::Error;

use crate::data::DataError;

/// Failures surfaced by the flow orchestrator and its collaborators.
///
/// Traversal faults are not listed here: they travel inside
/// [`StopReason::Error`](crate::traversal::StopReason::Error) so partial output
/// is kept.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unknown sequence '{0}'")]
    UnknownSequence(SequenceId),

    #[error("failed to load sequence '{sequence}': {reason}")]
    SequenceLoad { sequence: SequenceId, reason: String },

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no conversation session is active")]
    NoActiveSession,

    #[error("the conversation is not waiting for input")]
    NotAwaitingInput,

    #[error("message {message_id} expects {expected} input")]
    UnexpectedInput {
        message_id: MessageId,
        expected: &'static str,
    },

    #[error("choice {index} is out of range ({available} options)")]
    ChoiceOutOfRange { index: usize, available: usize },

    #[error("sequence '{sequence}' has no message {message_id}")]
    UnknownMessage {
        sequence: SequenceId,
        message_id: MessageId,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type FlowResult<T> = Result<T, FlowError>;
