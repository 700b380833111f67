//! User data - the live key/value store that templates read and data actions
//! write.
//!
//! Keys are dotted paths (`task.activeDays`) treated as opaque strings. How the
//! data is persisted is up to the implementation; the engine only relies on
//! these traits.

mod actions;
mod routing;

pub use actions::*;
pub use routing::*;

use async_trait::async_trait;
use flow_script::{ActiveDays, ScriptError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failures of user-data writes.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("value at '{key}' is {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("user data backend error: {0}")]
    Backend(String),
}

/// Read access to user data.
#[async_trait]
pub trait DataAccessor: Send + Sync {
    /// Current value at `key`; `None` when unset.
    async fn get_value(&self, key: &str) -> Option<Value>;
}

/// Read-write access to user data.
#[async_trait]
pub trait UserDataStore: DataAccessor {
    async fn set_value(&self, key: &str, value: Value) -> Result<(), DataError>;

    async fn remove_value(&self, key: &str) -> Result<Option<Value>, DataError>;
}

/// Typed reads on top of [`DataAccessor`].
#[async_trait]
pub trait DataAccessorExt: DataAccessor {
    /// Read and deserialize `key`. Missing, null or mistyped values yield
    /// `None`.
    async fn get_as<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).await.filter(|v| !v.is_null())?;
        serde_json::from_value(value).ok()
    }

    /// Read `key` as [`ActiveDays`], accepting either stored shape.
    async fn get_active_days(&self, key: &str) -> Result<Option<ActiveDays>, ScriptError> {
        match self.get_value(key).await {
            None | Some(Value::Null) => Ok(None),
            Some(value) => ActiveDays::try_from(value).map(Some),
        }
    }
}

impl<T: DataAccessor + ?Sized> DataAccessorExt for T {}

/// Process-local user data.
#[derive(Debug, Default)]
pub struct InMemoryUserData {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryUserData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.get_mut().insert(key.into(), value);
        self
    }

    /// Copy of every stored value.
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl DataAccessor for InMemoryUserData {
    async fn get_value(&self, key: &str) -> Option<Value> {
        self.values.read().await.get(key).cloned()
    }
}

#[async_trait]
impl UserDataStore for InMemoryUserData {
    async fn set_value(&self, key: &str, value: Value) -> Result<(), DataError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> Result<Option<Value>, DataError> {
        Ok(self.values.write().await.remove(key))
    }
}

#[async_trait]
impl DataAccessor for HashMap<String, Value> {
    async fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let data = InMemoryUserData::new();
        assert!(data.get_value("user.name").await.is_none());

        data.set_value("user.name", json!("Ana")).await.unwrap();
        assert_eq!(data.get_value("user.name").await, Some(json!("Ana")));

        let removed = data.remove_value("user.name").await.unwrap();
        assert_eq!(removed, Some(json!("Ana")));
        assert!(data.get_value("user.name").await.is_none());
    }

    #[tokio::test]
    async fn test_get_as_typed() {
        let data = InMemoryUserData::new()
            .with_value("streak", json!(4))
            .with_value("user.name", json!("Ana"))
            .with_value("nothing", Value::Null);

        assert_eq!(data.get_as::<i64>("streak").await, Some(4));
        assert_eq!(data.get_as::<String>("user.name").await.as_deref(), Some("Ana"));
        assert_eq!(data.get_as::<i64>("user.name").await, None);
        assert_eq!(data.get_as::<String>("nothing").await, None);
    }

    #[tokio::test]
    async fn test_active_days_either_shape() {
        let data = InMemoryUserData::new()
            .with_value("task.activeDays", json!("[1,3,5]"))
            .with_value("habit.activeDays", json!([5, 3, 1]));

        let task = data.get_active_days("task.activeDays").await.unwrap().unwrap();
        let habit = data.get_active_days("habit.activeDays").await.unwrap().unwrap();
        assert_eq!(task, habit);
        assert_eq!(task.days(), &[1, 3, 5]);

        assert!(data.get_active_days("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hash_map_accessor() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), json!(1));
        assert_eq!(map.get_value("a").await, Some(json!(1)));
        assert_eq!(map.get_value("b").await, None);
    }
}
