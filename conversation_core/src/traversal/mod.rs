//! Flow Traverser - walks a sequence from a starting message and decides
//! where to stop.
//!
//! Each call is a pure function of the start id and the sequence store:
//! 1. **Lookup**: a missing id ends the sequence gracefully
//! 2. **Auto route**: collected, then stop so the router can branch
//! 3. **Data action**: collected, traversal continues
//! 4. **Transition**: collected, stop with the target sequence
//! 5. **Interactive**: collected, stop and resume at the same message
//! 6. **Text**: collected, continue at the successor
//!
//! A hard step cap turns cyclic `nextMessageId` chains into an error result
//! instead of a hang.

mod result;

pub use result::*;

use flow_script::{Message, MessageId, MessageKind, SequenceStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of messages visited per traversal call.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Configuration for the traverser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Maximum messages visited in one call before reporting a fault.
    pub max_steps: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Walks a loaded sequence forward, batching messages until a stop condition.
#[derive(Debug, Clone, Default)]
pub struct FlowTraverser {
    config: TraversalConfig,
}

impl FlowTraverser {
    /// Create a traverser with the given configuration.
    pub fn new(config: TraversalConfig) -> Self {
        Self { config }
    }

    /// Create a traverser with the default step cap.
    pub fn with_defaults() -> Self {
        Self::new(TraversalConfig::default())
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Traverse from `start_id`, collecting messages in visitation order.
    pub fn traverse<S>(&self, start_id: MessageId, store: &S) -> TraversalResult
    where
        S: SequenceStore + ?Sized,
    {
        let mut messages: Vec<Message> = Vec::new();
        let mut current = Some(start_id);

        for _ in 0..self.config.max_steps {
            let Some(id) = current else {
                return TraversalResult::new(messages, StopReason::EndOfSequence);
            };

            let Some(message) = store.get_message_by_id(id) else {
                debug!(
                    message_id = %id,
                    collected = messages.len(),
                    "message not found, ending sequence"
                );
                return TraversalResult::new(messages, StopReason::EndOfSequence);
            };

            messages.push(message.clone());

            match &message.kind {
                MessageKind::AutoRoute(_) => {
                    debug!(message_id = %id, "stopping at auto route");
                    return TraversalResult::new(
                        messages,
                        StopReason::InteractiveMessage { next_message_id: id },
                    );
                }
                MessageKind::DataAction(_) => {}
                MessageKind::SequenceTransition(target) => {
                    debug!(
                        message_id = %id,
                        target = %target,
                        "stopping at sequence transition"
                    );
                    return TraversalResult::new(
                        messages,
                        StopReason::SequenceTransition {
                            target_sequence_id: target.clone(),
                        },
                    );
                }
                MessageKind::Choice { .. } | MessageKind::TextInput { .. } => {
                    debug!(
                        message_id = %id,
                        kind = message.kind.name(),
                        "stopping for user input"
                    );
                    return TraversalResult::new(
                        messages,
                        StopReason::InteractiveMessage { next_message_id: id },
                    );
                }
                MessageKind::Text => {}
            }

            current = message.successor();
        }

        // The budget is spent; only a successor that actually exists means
        // the walk would have gone on.
        match current {
            Some(id) if store.has_message(id) => {}
            _ => return TraversalResult::new(messages, StopReason::EndOfSequence),
        }

        let error = TraversalError::DepthExceeded {
            start: start_id,
            steps: self.config.max_steps,
        };
        warn!(start = %start_id, steps = self.config.max_steps, "traversal depth cap exceeded");
        TraversalResult::new(messages, StopReason::Error(error))
    }
}
