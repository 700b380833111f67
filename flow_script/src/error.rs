//! Errors raised while building or loading script definitions.

use thiserror::Error;

use crate::messages::MessageId;

/// Failures of the script layer. Traversal never produces these; they surface
/// only when a sequence is constructed or a user value is canonicalized.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to parse sequence definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sequence '{sequence}' defines message {id} more than once")]
    DuplicateMessage { sequence: String, id: MessageId },

    #[error("sequence '{0}' contains no messages")]
    EmptySequence(String),

    #[error("message {id} of type {kind} is missing its '{field}' payload")]
    MissingPayload {
        id: MessageId,
        kind: &'static str,
        field: &'static str,
    },

    #[error("invalid active days: {0}")]
    InvalidActiveDays(String),
}

pub type ScriptResult<T> = Result<T, ScriptError>;
