//! The message record and its kind-specific payloads.

use serde::{Deserialize, Serialize};

use super::{MessageId, SequenceId, Sender};
use crate::actions::{AutoRoute, DataAction, RouteRule};
use crate::error::ScriptError;

/// A single step of a sequence. Immutable once loaded.
///
/// The behaviour of a message during traversal is decided entirely by its
/// [`MessageKind`]; there are no independent flags that could disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage", into = "RawMessage")]
pub struct Message {
    pub id: MessageId,

    pub kind: MessageKind,

    /// Explicit successor. Overrides the sequential `id + 1` fallback.
    pub next_message_id: Option<MessageId>,

    /// Raw display text, possibly containing `{key|fallback}` placeholders.
    pub text: String,

    /// Optional semantic key (`actor.action.subject[.modifier]*`) used to look
    /// up alternative phrasing for `text`.
    pub content_key: Option<String>,

    pub sender: Sender,
}

/// What a message does when the traverser reaches it.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    /// Plain display text; traversal continues past it.
    Text,

    /// A set of options the user must pick from.
    Choice {
        options: Vec<ChoiceOption>,
        /// User-data key the picked option's value is written to.
        store_key: Option<String>,
    },

    /// Free-text input from the user.
    TextInput {
        hint: Option<String>,
        store_key: Option<String>,
    },

    /// A side effect run by the orchestrator; never stops traversal.
    DataAction(DataAction),

    /// A branch resolved outside the traverser against user data.
    AutoRoute(AutoRoute),

    /// Hand-off to another named sequence.
    SequenceTransition(SequenceId),
}

impl MessageKind {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Choice { .. } => "choice",
            MessageKind::TextInput { .. } => "textInput",
            MessageKind::DataAction(_) => "dataAction",
            MessageKind::AutoRoute(_) => "autoRoute",
            MessageKind::SequenceTransition(_) => "sequenceTransition",
        }
    }
}

/// One selectable answer of a choice message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub text: String,

    /// Where to continue after this option is picked. Falls back to the
    /// choice message's own successor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_message_id: Option<MessageId>,

    /// Value stored under the choice's `store_key`. Defaults to `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_message_id: None,
            value: None,
        }
    }

    pub fn with_next(mut self, next: impl Into<MessageId>) -> Self {
        self.next_message_id = Some(next.into());
        self
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    /// The value recorded when this option is picked.
    pub fn stored_value(&self) -> serde_json::Value {
        self.value
            .clone()
            .unwrap_or_else(|| serde_json::Value::String(self.text.clone()))
    }
}

impl Message {
    fn with_kind(id: impl Into<MessageId>, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            next_message_id: None,
            text: text.into(),
            content_key: None,
            sender: Sender::Bot,
        }
    }

    /// Create a plain text message.
    pub fn text(id: impl Into<MessageId>, text: impl Into<String>) -> Self {
        Self::with_kind(id, MessageKind::Text, text)
    }

    /// Create a choice message.
    pub fn choice(
        id: impl Into<MessageId>,
        text: impl Into<String>,
        options: Vec<ChoiceOption>,
    ) -> Self {
        Self::with_kind(
            id,
            MessageKind::Choice {
                options,
                store_key: None,
            },
            text,
        )
    }

    /// Create a free-text input message.
    pub fn text_input(id: impl Into<MessageId>, text: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            MessageKind::TextInput {
                hint: None,
                store_key: None,
            },
            text,
        )
    }

    /// Create a data-action message.
    pub fn data_action(id: impl Into<MessageId>, action: DataAction) -> Self {
        Self::with_kind(id, MessageKind::DataAction(action), "")
    }

    /// Create an auto-route message.
    pub fn auto_route(id: impl Into<MessageId>, route: AutoRoute) -> Self {
        Self::with_kind(id, MessageKind::AutoRoute(route), "")
    }

    /// Create a message handing off to another sequence.
    pub fn transition(
        id: impl Into<MessageId>,
        text: impl Into<String>,
        target: impl Into<SequenceId>,
    ) -> Self {
        Self::with_kind(id, MessageKind::SequenceTransition(target.into()), text)
    }

    /// Set the explicit successor.
    pub fn with_next(mut self, next: impl Into<MessageId>) -> Self {
        self.next_message_id = Some(next.into());
        self
    }

    /// Set the semantic content key.
    pub fn with_content_key(mut self, key: impl Into<String>) -> Self {
        self.content_key = Some(key.into());
        self
    }

    /// Set the user-data key that input or choice values are written to.
    /// Has no effect on other kinds.
    pub fn with_store_key(mut self, key: impl Into<String>) -> Self {
        match &mut self.kind {
            MessageKind::Choice { store_key, .. } | MessageKind::TextInput { store_key, .. } => {
                *store_key = Some(key.into());
            }
            _ => {}
        }
        self
    }

    /// Set the sender.
    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = sender;
        self
    }

    /// Successor used when nothing stops traversal at this message.
    pub fn successor(&self) -> Option<MessageId> {
        self.next_message_id.or_else(|| self.id.next())
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, MessageKind::Choice { .. })
    }

    pub fn is_text_input(&self) -> bool {
        matches!(self.kind, MessageKind::TextInput { .. })
    }

    pub fn is_data_action(&self) -> bool {
        matches!(self.kind, MessageKind::DataAction(_))
    }

    pub fn is_auto_route(&self) -> bool {
        matches!(self.kind, MessageKind::AutoRoute(_))
    }

    /// Whether the user must respond before traversal may continue.
    pub fn is_interactive(&self) -> bool {
        self.is_choice() || self.is_text_input()
    }

    /// Target sequence when this message hands off to another sequence.
    pub fn transition_target(&self) -> Option<&SequenceId> {
        match &self.kind {
            MessageKind::SequenceTransition(target) => Some(target),
            _ => None,
        }
    }
}

/// Declared `type` of a message in its serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
enum MessageType {
    #[default]
    Text,
    Choice,
    TextInput,
    DataAction,
    AutoRoute,
}

/// Flat wire shape of a message, as authored in sequence files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    id: MessageId,
    #[serde(rename = "type", default)]
    message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_message_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequence_id: Option<SequenceId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_key: Option<String>,
    #[serde(default)]
    sender: Sender,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<DataAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    routes: Vec<RouteRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_next: Option<MessageId>,
}

impl TryFrom<RawMessage> for Message {
    type Error = ScriptError;

    /// Folds the authored `type` and `sequenceId` into one kind. Auto routes
    /// and data actions take precedence over a declared `sequenceId`, which in
    /// turn takes precedence over choice and text input.
    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let kind = match (raw.message_type, raw.sequence_id) {
            (MessageType::AutoRoute, _) => MessageKind::AutoRoute(AutoRoute {
                routes: raw.routes,
                default_next: raw.default_next,
            }),
            (MessageType::DataAction, _) => {
                let action = raw.action.ok_or(ScriptError::MissingPayload {
                    id: raw.id,
                    kind: "dataAction",
                    field: "action",
                })?;
                MessageKind::DataAction(action)
            }
            (_, Some(target)) => MessageKind::SequenceTransition(target),
            (MessageType::Choice, None) => MessageKind::Choice {
                options: raw.options,
                store_key: raw.store_key,
            },
            (MessageType::TextInput, None) => MessageKind::TextInput {
                hint: raw.hint,
                store_key: raw.store_key,
            },
            (MessageType::Text, None) => MessageKind::Text,
        };

        Ok(Message {
            id: raw.id,
            kind,
            next_message_id: raw.next_message_id,
            text: raw.text,
            content_key: raw.content_key,
            sender: raw.sender,
        })
    }
}

impl From<Message> for RawMessage {
    fn from(message: Message) -> Self {
        let mut raw = RawMessage {
            id: message.id,
            message_type: MessageType::Text,
            next_message_id: message.next_message_id,
            sequence_id: None,
            text: message.text,
            content_key: message.content_key,
            sender: message.sender,
            options: Vec::new(),
            store_key: None,
            hint: None,
            action: None,
            routes: Vec::new(),
            default_next: None,
        };

        match message.kind {
            MessageKind::Text => {}
            MessageKind::Choice { options, store_key } => {
                raw.message_type = MessageType::Choice;
                raw.options = options;
                raw.store_key = store_key;
            }
            MessageKind::TextInput { hint, store_key } => {
                raw.message_type = MessageType::TextInput;
                raw.hint = hint;
                raw.store_key = store_key;
            }
            MessageKind::DataAction(action) => {
                raw.message_type = MessageType::DataAction;
                raw.action = Some(action);
            }
            MessageKind::AutoRoute(route) => {
                raw.message_type = MessageType::AutoRoute;
                raw.routes = route.routes;
                raw.default_next = route.default_next;
            }
            MessageKind::SequenceTransition(target) => {
                raw.sequence_id = Some(target);
            }
        }

        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::RouteCondition;
    use serde_json::json;

    #[test]
    fn test_successor_prefers_explicit_next() {
        let message = Message::text(3, "Hello").with_next(10);
        assert_eq!(message.successor(), Some(MessageId(10)));

        let sequential = Message::text(3, "Hello");
        assert_eq!(sequential.successor(), Some(MessageId(4)));
    }

    #[test]
    fn test_kind_predicates_are_exclusive() {
        let choice = Message::choice(1, "Pick", vec![ChoiceOption::new("A")]);
        assert!(choice.is_choice());
        assert!(choice.is_interactive());
        assert!(!choice.is_text_input());
        assert!(!choice.is_data_action());
        assert!(!choice.is_auto_route());
        assert!(choice.transition_target().is_none());

        let plain = Message::text(2, "Hi");
        assert!(!plain.is_interactive());
        assert!(!plain.is_choice());
    }

    #[test]
    fn test_parse_choice_message() {
        let message: Message = serde_json::from_value(json!({
            "id": 5,
            "type": "choice",
            "text": "How are you?",
            "storeKey": "user.mood",
            "options": [
                { "text": "Great", "nextMessageId": 6 },
                { "text": "Meh", "value": "low" }
            ]
        }))
        .unwrap();

        assert_eq!(message.id, MessageId(5));
        match &message.kind {
            MessageKind::Choice { options, store_key } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].next_message_id, Some(MessageId(6)));
                assert_eq!(options[1].stored_value(), json!("low"));
                assert_eq!(options[0].stored_value(), json!("Great"));
                assert_eq!(store_key.as_deref(), Some("user.mood"));
            }
            other => panic!("expected choice, got {:?}", other),
        }
    }

    #[test]
    fn test_sequence_id_becomes_transition() {
        let message: Message = serde_json::from_value(json!({
            "id": 9,
            "type": "text",
            "text": "Let's set up your task",
            "sequenceId": "task_setup"
        }))
        .unwrap();

        assert_eq!(
            message.transition_target(),
            Some(&SequenceId::new("task_setup"))
        );
    }

    #[test]
    fn test_auto_route_wins_over_sequence_id() {
        let message: Message = serde_json::from_value(json!({
            "id": 2,
            "type": "autoRoute",
            "sequenceId": "elsewhere",
            "routes": [
                { "when": "exists", "key": "user.name", "nextMessageId": 10 }
            ],
            "defaultNext": 20
        }))
        .unwrap();

        match &message.kind {
            MessageKind::AutoRoute(route) => {
                assert_eq!(route.routes.len(), 1);
                assert_eq!(
                    route.routes[0].condition,
                    RouteCondition::Exists {
                        key: "user.name".to_string()
                    }
                );
                assert_eq!(route.default_next, Some(MessageId(20)));
            }
            other => panic!("expected auto route, got {:?}", other),
        }
    }

    #[test]
    fn test_data_action_requires_action() {
        let result: Result<Message, _> = serde_json::from_value(json!({
            "id": 4,
            "type": "dataAction"
        }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("action"), "unexpected error: {}", err);
    }

    #[test]
    fn test_serialize_transition_as_sequence_id() {
        let message = Message::transition(7, "Moving on", "wrap_up");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["sequenceId"], "wrap_up");

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, message);
    }
}
