//! Flow Orchestrator - glue between the traverser, the data store and the
//! renderers.
//!
//! One step of a conversation:
//! 1. **Traverse** the active sequence from the current position
//! 2. **Apply** collected data actions in visitation order
//! 3. **Render** displayable messages (content key, then placeholders)
//! 4. **React** to the stop reason: wait for input, follow an auto route,
//!    switch sequence, or end

mod render;
mod session;

pub use render::*;
pub use session::*;

use flow_script::{
    Message, MessageId, MessageKind, ScriptError, Sequence, SequenceId, SequenceStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::FlowConfig;
use crate::content::ContentResolver;
use crate::data::{apply_action, resolve_route, ActionOutcome, UserDataStore};
use crate::error::{FlowError, FlowResult};
use crate::library::SequenceLibrary;
use crate::template::TemplateEngine;
use crate::traversal::{FlowTraverser, StopReason, TraversalResult};

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Message a sequence is entered at, when it exists. Otherwise the lowest
    /// id is used.
    pub entry_message_id: MessageId,

    /// Sequence transitions plus auto-route hops allowed in one step.
    pub max_hops: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            entry_message_id: MessageId(1),
            max_hops: 16,
        }
    }
}

/// Drives one conversation through its sequences.
pub struct FlowOrchestrator {
    library: SequenceLibrary,
    traverser: FlowTraverser,
    resolver: ContentResolver,
    templates: TemplateEngine,
    data: Arc<dyn UserDataStore>,
    config: OrchestratorConfig,
    session: Option<Session>,
}

impl FlowOrchestrator {
    /// Create an orchestrator with default traversal and orchestration
    /// settings.
    pub fn new(
        library: SequenceLibrary,
        resolver: ContentResolver,
        data: Arc<dyn UserDataStore>,
    ) -> Self {
        Self {
            library,
            traverser: FlowTraverser::with_defaults(),
            resolver,
            templates: TemplateEngine::new(),
            data,
            config: OrchestratorConfig::default(),
            session: None,
        }
    }

    /// Apply the traversal and orchestrator sections of `config`. The content
    /// section belongs to the resolver.
    pub fn with_config(mut self, config: &FlowConfig) -> Self {
        self.traverser = FlowTraverser::new(config.traversal.clone());
        self.config = config.orchestrator.clone();
        self
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn status(&self) -> Option<&FlowStatus> {
        self.session.as_ref().map(|s| &s.status)
    }

    pub fn current_sequence(&self) -> Option<&SequenceId> {
        self.session.as_ref().map(|s| s.sequence_id())
    }

    pub fn data(&self) -> &Arc<dyn UserDataStore> {
        &self.data
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Begin a new session in `sequence_id`, at `start_at` or the sequence's
    /// entry point. Replaces any current session.
    pub async fn start(
        &mut self,
        sequence_id: &SequenceId,
        start_at: Option<MessageId>,
    ) -> FlowResult<RenderedBatch> {
        let sequence = self.library.get(sequence_id).await?;
        let start = match start_at {
            Some(id) => id,
            None => self.entry_point(&sequence)?,
        };

        let session = Session::new(sequence);
        info!(
            session = %session.id,
            sequence = %sequence_id,
            start = %start,
            "conversation started"
        );
        self.session = Some(session);

        self.run_from(start).await
    }

    /// Answer the pending choice with option `index`.
    pub async fn submit_choice(&mut self, index: usize) -> FlowResult<RenderedBatch> {
        let message = self.awaiting_message()?;
        let MessageKind::Choice { options, store_key } = &message.kind else {
            return Err(FlowError::UnexpectedInput {
                message_id: message.id,
                expected: message.kind.name(),
            });
        };

        let option = options.get(index).ok_or(FlowError::ChoiceOutOfRange {
            index,
            available: options.len(),
        })?;

        if let Some(key) = store_key {
            self.data.set_value(key, option.stored_value()).await?;
        }

        let next = option.next_message_id.or_else(|| message.successor());
        self.continue_at(next).await
    }

    /// Answer the pending text input.
    pub async fn submit_text(&mut self, input: &str) -> FlowResult<RenderedBatch> {
        let message = self.awaiting_message()?;
        let MessageKind::TextInput { store_key, .. } = &message.kind else {
            return Err(FlowError::UnexpectedInput {
                message_id: message.id,
                expected: message.kind.name(),
            });
        };

        if let Some(key) = store_key {
            self.data
                .set_value(key, Value::String(input.trim().to_string()))
                .await?;
        }

        self.continue_at(message.successor()).await
    }

    /// Move past the pending interactive message without answering it. Nothing
    /// is stored; a choice continues at its own successor, not an option's.
    pub async fn advance(&mut self) -> FlowResult<RenderedBatch> {
        let message = self.awaiting_message()?;
        self.continue_at(message.successor()).await
    }

    /// Resume the current sequence at `message_id`, e.g. after a fault.
    pub async fn reset_to(&mut self, message_id: MessageId) -> FlowResult<RenderedBatch> {
        let session = self.session.as_ref().ok_or(FlowError::NoActiveSession)?;
        if !session.sequence.has_message(message_id) {
            return Err(FlowError::UnknownMessage {
                sequence: session.sequence_id().clone(),
                message_id,
            });
        }
        self.run_from(message_id).await
    }

    fn awaiting_message(&self) -> FlowResult<Message> {
        let session = self.session.as_ref().ok_or(FlowError::NoActiveSession)?;
        let FlowStatus::AwaitingInput { message_id } = session.status else {
            return Err(FlowError::NotAwaitingInput);
        };
        session
            .sequence
            .get_message_by_id(message_id)
            .cloned()
            .ok_or_else(|| FlowError::UnknownMessage {
                sequence: session.sequence_id().clone(),
                message_id,
            })
    }

    fn entry_point(&self, sequence: &Sequence) -> FlowResult<MessageId> {
        if sequence.has_message(self.config.entry_message_id) {
            return Ok(self.config.entry_message_id);
        }
        sequence
            .first_message_id()
            .ok_or_else(|| ScriptError::EmptySequence(sequence.id().to_string()).into())
    }

    async fn continue_at(&mut self, next: Option<MessageId>) -> FlowResult<RenderedBatch> {
        match next {
            Some(id) => self.run_from(id).await,
            None => {
                let sequence = self
                    .session
                    .as_ref()
                    .ok_or(FlowError::NoActiveSession)?
                    .sequence
                    .clone();
                Ok(self.finish(sequence, RenderedBatch::new()))
            }
        }
    }

    async fn run_from(&mut self, start: MessageId) -> FlowResult<RenderedBatch> {
        let mut sequence = self
            .session
            .as_ref()
            .ok_or(FlowError::NoActiveSession)?
            .sequence
            .clone();
        let mut batch = RenderedBatch::new();
        let mut next = start;

        for _ in 0..=self.config.max_hops {
            let TraversalResult {
                messages,
                stop_reason,
            } = self.traverser.traverse(next, sequence.as_ref());

            match stop_reason {
                StopReason::Error(error) => {
                    // Partial output is rendered but its data actions are not
                    // run; a cycle would otherwise repeat them.
                    warn!(
                        sequence = %sequence.id(),
                        start = %next,
                        error = %error,
                        "traversal faulted"
                    );
                    for message in &messages {
                        if let Some(rendered) = self.render(message, sequence.id()).await {
                            batch.messages.push(rendered);
                        }
                    }
                    batch.status = FlowStatus::Faulted {
                        error: error.into(),
                        resume_at: next,
                    };
                    return Ok(self.finish(sequence, batch));
                }
                StopReason::EndOfSequence => {
                    self.apply_all(&messages, sequence.id(), &mut batch).await;
                    batch.status = FlowStatus::Ended;
                    return Ok(self.finish(sequence, batch));
                }
                StopReason::SequenceTransition { target_sequence_id } => {
                    self.apply_all(&messages, sequence.id(), &mut batch).await;
                    match self.enter(&target_sequence_id).await {
                        Ok((target, entry)) => {
                            info!(
                                from = %sequence.id(),
                                to = %target_sequence_id,
                                entry = %entry,
                                "sequence transition"
                            );
                            sequence = target;
                            next = entry;
                        }
                        Err(e) => {
                            // Stay on the transition message so a retry does
                            // not re-run the actions already applied.
                            warn!(
                                to = %target_sequence_id,
                                error = %e,
                                "sequence transition failed"
                            );
                            let resume_at = messages.last().map_or(next, |m| m.id);
                            batch.status = FlowStatus::Faulted {
                                error: FlowFault::Transition {
                                    target: target_sequence_id,
                                    reason: e.to_string(),
                                },
                                resume_at,
                            };
                            return Ok(self.finish(sequence, batch));
                        }
                    }
                }
                StopReason::InteractiveMessage { next_message_id } => {
                    self.apply_all(&messages, sequence.id(), &mut batch).await;
                    let route = match messages.last().map(|m| &m.kind) {
                        Some(MessageKind::AutoRoute(route)) => Some(route),
                        _ => None,
                    };
                    let Some(route) = route else {
                        batch.status = FlowStatus::AwaitingInput {
                            message_id: next_message_id,
                        };
                        return Ok(self.finish(sequence, batch));
                    };
                    match resolve_route(route, self.data.as_ref()).await {
                        Some(target) => next = target,
                        None => {
                            info!(
                                message_id = %next_message_id,
                                "auto route has no matching branch, ending"
                            );
                            batch.status = FlowStatus::Ended;
                            return Ok(self.finish(sequence, batch));
                        }
                    }
                }
            }
        }

        warn!(max_hops = self.config.max_hops, resume_at = %next, "hop limit reached");
        batch.status = FlowStatus::Faulted {
            error: FlowFault::TooManyHops(self.config.max_hops),
            resume_at: next,
        };
        Ok(self.finish(sequence, batch))
    }

    /// Load `target` and pick its entry message.
    async fn enter(&self, target: &SequenceId) -> FlowResult<(Arc<Sequence>, MessageId)> {
        let sequence = self.library.get(target).await?;
        let entry = self.entry_point(&sequence)?;
        Ok((sequence, entry))
    }

    /// Record where the session stands and hand the batch back.
    fn finish(&mut self, sequence: Arc<Sequence>, batch: RenderedBatch) -> RenderedBatch {
        if let Some(session) = self.session.as_mut() {
            session.sequence = sequence;
            session.status = batch.status.clone();
        }
        batch
    }

    /// Run data actions and render everything else, in visitation order.
    async fn apply_all(
        &self,
        messages: &[Message],
        sequence_id: &SequenceId,
        batch: &mut RenderedBatch,
    ) {
        for message in messages {
            match &message.kind {
                MessageKind::DataAction(action) => {
                    match apply_action(self.data.as_ref(), action).await {
                        Ok(ActionOutcome::Triggered { event, payload }) => {
                            batch.events.push(FlowEvent {
                                message_id: message.id,
                                sequence_id: sequence_id.clone(),
                                event,
                                payload,
                            });
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                message_id = %message.id,
                                error = %e,
                                "data action failed, continuing"
                            );
                        }
                    }
                }
                _ => {
                    if let Some(rendered) = self.render(message, sequence_id).await {
                        batch.messages.push(rendered);
                    }
                }
            }
        }
    }

    /// Display form of `message`; `None` for messages with nothing to show.
    async fn render(
        &self,
        message: &Message,
        sequence_id: &SequenceId,
    ) -> Option<RenderedMessage> {
        let kind = match &message.kind {
            MessageKind::Text | MessageKind::SequenceTransition(_) => RenderedKind::Text,
            MessageKind::Choice { options, .. } => {
                let mut rendered = Vec::with_capacity(options.len());
                for option in options {
                    let text = self.templates.render(&option.text, self.data.as_ref()).await;
                    rendered.push(text);
                }
                RenderedKind::Choice { options: rendered }
            }
            MessageKind::TextInput { hint, .. } => RenderedKind::TextInput {
                hint: hint.clone(),
            },
            MessageKind::DataAction(_) | MessageKind::AutoRoute(_) => return None,
        };

        let text = self.render_text(message).await;
        if text.is_empty() && kind == RenderedKind::Text {
            return None;
        }

        Some(RenderedMessage {
            id: message.id,
            sequence_id: sequence_id.clone(),
            sender: message.sender,
            text,
            kind,
        })
    }

    /// Resolve the content key against the raw text, then fill placeholders.
    /// Only unfilled lines reach the resolver cache, so values stay live.
    async fn render_text(&self, message: &Message) -> String {
        let line = match &message.content_key {
            Some(key) => self.resolver.resolve(key, &message.text).await,
            None => message.text.clone(),
        };
        self.templates.render(&line, self.data.as_ref()).await
    }
}

impl std::fmt::Debug for FlowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowOrchestrator")
            .field("library", &self.library)
            .field("traverser", &self.traverser)
            .field("config", &self.config)
            .field("session", &self.session_id())
            .field("status", &self.status())
            .finish()
    }
}
