//! Script mechanics: data actions and auto-route rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::MessageId;

/// Side effects a data-action message asks the orchestrator to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DataAction {
    /// Write `value` under `key`.
    Set { key: String, value: Value },

    /// Add `by` to a numeric value (missing counts as zero).
    Increment {
        key: String,
        #[serde(default = "default_increment")]
        by: i64,
    },

    /// Flip a boolean value (missing counts as false).
    Toggle { key: String },

    /// Push `value` onto a list (missing counts as empty).
    Append { key: String, value: Value },

    /// Delete `key`.
    Remove { key: String },

    /// Named side effect handled outside the engine (notifications, analytics).
    Trigger {
        event: String,
        #[serde(default)]
        payload: Value,
    },
}

fn default_increment() -> i64 {
    1
}

impl DataAction {
    /// The user-data key this action writes, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            DataAction::Set { key, .. }
            | DataAction::Increment { key, .. }
            | DataAction::Toggle { key }
            | DataAction::Append { key, .. }
            | DataAction::Remove { key } => Some(key),
            DataAction::Trigger { .. } => None,
        }
    }
}

/// Branching rules of an auto-route message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutoRoute {
    /// Tried in order; the first matching rule wins.
    #[serde(default)]
    pub routes: Vec<RouteRule>,

    /// Target when no rule matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_next: Option<MessageId>,
}

impl AutoRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, condition: RouteCondition, next: impl Into<MessageId>) -> Self {
        self.routes.push(RouteRule {
            condition,
            next_message_id: next.into(),
        });
        self
    }

    pub fn with_default(mut self, next: impl Into<MessageId>) -> Self {
        self.default_next = Some(next.into());
        self
    }
}

/// A single conditional branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    #[serde(flatten)]
    pub condition: RouteCondition,
    pub next_message_id: MessageId,
}

/// Predicate over a single user-data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "camelCase")]
pub enum RouteCondition {
    Always,
    Exists { key: String },
    Equals { key: String, value: Value },
    NotEquals { key: String, value: Value },
    GreaterThan { key: String, value: f64 },
    LessThan { key: String, value: f64 },
    /// String containment, or list membership for arrays.
    Contains { key: String, value: Value },
}

impl RouteCondition {
    /// The user-data key this condition inspects.
    pub fn key(&self) -> Option<&str> {
        match self {
            RouteCondition::Always => None,
            RouteCondition::Exists { key }
            | RouteCondition::Equals { key, .. }
            | RouteCondition::NotEquals { key, .. }
            | RouteCondition::GreaterThan { key, .. }
            | RouteCondition::LessThan { key, .. }
            | RouteCondition::Contains { key, .. } => Some(key),
        }
    }

    /// Evaluate against the current value of [`key`](Self::key).
    /// A JSON `null` counts as absent.
    pub fn evaluate(&self, current: Option<&Value>) -> bool {
        let current = current.filter(|v| !v.is_null());
        match self {
            RouteCondition::Always => true,
            RouteCondition::Exists { .. } => current.is_some(),
            RouteCondition::Equals { value, .. } => current == Some(value),
            RouteCondition::NotEquals { value, .. } => current != Some(value),
            RouteCondition::GreaterThan { value, .. } => {
                current.and_then(as_number).is_some_and(|n| n > *value)
            }
            RouteCondition::LessThan { value, .. } => {
                current.and_then(as_number).is_some_and(|n| n < *value)
            }
            RouteCondition::Contains { value, .. } => match (current, value) {
                (Some(Value::Array(items)), needle) => items.contains(needle),
                (Some(Value::String(haystack)), Value::String(needle)) => {
                    haystack.contains(needle.as_str())
                }
                _ => false,
            },
        }
    }
}

/// Numeric view of a value; numeric strings count too.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
