//! Per-key memo of resolved content.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolved text by exact semantic-key string, fallbacks included.
///
/// Each key owns its own cell, so different keys never wait on each other
/// while concurrent calls for one key share a single resolution.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: DashMap<String, Arc<OnceCell<String>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously resolved text for `key`, if resolution has finished.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    /// Return the cached text for `key`, running `resolve` at most once per
    /// key to produce it. Concurrent callers for the same key wait for the
    /// first resolution instead of starting their own.
    pub async fn get_or_resolve<F, Fut>(&self, key: &str, resolve: F) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        let cell = self.entries.entry(key.to_string()).or_default().clone();
        cell.get_or_init(resolve).await.clone()
    }

    /// Store `text` unless `key` already has a value. Returns whether it was
    /// stored.
    pub fn insert(&self, key: impl Into<String>, text: impl Into<String>) -> bool {
        let cell = self.entries.entry(key.into()).or_default().clone();
        cell.set(text.into()).is_ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys with a finished resolution.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memoized value.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
