//! Data-action execution against a user-data store.

use flow_script::DataAction;
use serde_json::Value;
use tracing::debug;

use super::{DataError, UserDataStore};

/// What running a data action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// `key` now holds `value`.
    Updated { key: String, value: Value },

    /// `key` was deleted.
    Removed { key: String },

    /// An external side effect was requested; the engine does not run it.
    Triggered { event: String, payload: Value },
}

/// Apply `action` to `store`.
pub async fn apply_action<S>(store: &S, action: &DataAction) -> Result<ActionOutcome, DataError>
where
    S: UserDataStore + ?Sized,
{
    let outcome = match action {
        DataAction::Set { key, value } => {
            store.set_value(key, value.clone()).await?;
            ActionOutcome::Updated {
                key: key.clone(),
                value: value.clone(),
            }
        }
        DataAction::Increment { key, by } => {
            let stored = store.get_value(key).await;
            let current = match &stored {
                None | Some(Value::Null) => Some(0),
                Some(Value::Number(n)) => n.as_i64(),
                Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
                Some(_) => None,
            };
            let Some(current) = current else {
                return Err(mismatch(key, "an integer", stored.as_ref().unwrap_or(&Value::Null)));
            };
            let value = Value::from(current.saturating_add(*by));
            store.set_value(key, value.clone()).await?;
            ActionOutcome::Updated {
                key: key.clone(),
                value,
            }
        }
        DataAction::Toggle { key } => {
            let current = match store.get_value(key).await {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => b,
                Some(other) => return Err(mismatch(key, "a boolean", &other)),
            };
            let value = Value::Bool(!current);
            store.set_value(key, value.clone()).await?;
            ActionOutcome::Updated {
                key: key.clone(),
                value,
            }
        }
        DataAction::Append { key, value } => {
            let mut items = match store.get_value(key).await {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items,
                Some(other) => return Err(mismatch(key, "a list", &other)),
            };
            items.push(value.clone());
            let value = Value::Array(items);
            store.set_value(key, value.clone()).await?;
            ActionOutcome::Updated {
                key: key.clone(),
                value,
            }
        }
        DataAction::Remove { key } => {
            store.remove_value(key).await?;
            ActionOutcome::Removed { key: key.clone() }
        }
        DataAction::Trigger { event, payload } => ActionOutcome::Triggered {
            event: event.clone(),
            payload: payload.clone(),
        },
    };

    debug!(?outcome, "data action applied");
    Ok(outcome)
}

fn mismatch(key: &str, expected: &'static str, found: &Value) -> DataError {
    DataError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataAccessor, InMemoryUserData};
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_remove() {
        let store = InMemoryUserData::new();

        apply_action(
            &store,
            &DataAction::Set {
                key: "task.name".to_string(),
                value: json!("Stretch"),
            },
        )
        .await
        .unwrap();
        assert_eq!(store.get_value("task.name").await, Some(json!("Stretch")));

        let outcome = apply_action(
            &store,
            &DataAction::Remove {
                key: "task.name".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Removed {
                key: "task.name".to_string()
            }
        );
        assert!(store.get_value("task.name").await.is_none());
    }

    #[tokio::test]
    async fn test_increment_from_missing_and_existing() {
        let store = InMemoryUserData::new().with_value("visits", json!("2"));
        let inc = |key: &str, by| DataAction::Increment {
            key: key.to_string(),
            by,
        };

        apply_action(&store, &inc("streak", 1)).await.unwrap();
        apply_action(&store, &inc("streak", 2)).await.unwrap();
        apply_action(&store, &inc("visits", 1)).await.unwrap();

        assert_eq!(store.get_value("streak").await, Some(json!(3)));
        assert_eq!(store.get_value("visits").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_numbers() {
        let store = InMemoryUserData::new().with_value("streak", json!(["a"]));

        let err = apply_action(
            &store,
            &DataAction::Increment {
                key: "streak".to_string(),
                by: 1,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DataError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_toggle_and_append() {
        let store = InMemoryUserData::new();

        let toggle = DataAction::Toggle {
            key: "reminders.enabled".to_string(),
        };
        apply_action(&store, &toggle).await.unwrap();
        assert_eq!(store.get_value("reminders.enabled").await, Some(json!(true)));
        apply_action(&store, &toggle).await.unwrap();
        assert_eq!(store.get_value("reminders.enabled").await, Some(json!(false)));

        for day in [1, 4] {
            apply_action(
                &store,
                &DataAction::Append {
                    key: "task.activeDays".to_string(),
                    value: json!(day),
                },
            )
            .await
            .unwrap();
        }
        assert_eq!(store.get_value("task.activeDays").await, Some(json!([1, 4])));
    }

    #[tokio::test]
    async fn test_trigger_touches_nothing() {
        let store = InMemoryUserData::new();

        let outcome = apply_action(
            &store,
            &DataAction::Trigger {
                event: "schedule_reminder".to_string(),
                payload: json!({"hour": 9}),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::Triggered {
                event: "schedule_reminder".to_string(),
                payload: json!({"hour": 9}),
            }
        );
        assert!(store.snapshot().await.is_empty());
    }
}
