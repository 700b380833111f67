//! Semantic Content Resolver - turns a semantic key plus literal fallback into
//! one line of display text.
//!
//! Resolution works as follows:
//! 1. **Cache**: an exact-string hit on the key returns immediately
//! 2. **Parse**: keys with fewer than three dot parts resolve to the fallback
//! 3. **Chain**: build candidate resources, most specific first
//! 4. **Search**: the first candidate with a non-blank line wins
//! 5. **Variant**: one non-blank line is picked through the random source
//! 6. **Memoize**: the outcome, fallback included, is cached under the key

mod cache;
mod key;
mod loader;
mod random;

pub use cache::*;
pub use key::*;
pub use loader::*;
pub use random::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Layout of the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Top-level namespace of content resources.
    pub root: String,

    /// File extension of content resources, without the dot.
    pub extension: String,

    /// Suffixes that map a specific subject to a generic one.
    pub generic_suffixes: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: "content".to_string(),
            extension: "txt".to_string(),
            generic_suffixes: DEFAULT_GENERIC_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ContentConfig {
    /// Resource paths to try for `key`, in order.
    pub fn candidate_paths(&self, key: &SemanticKey) -> Vec<String> {
        key.candidate_names(&self.generic_suffixes)
            .into_iter()
            .map(|name| self.resource_path(&key.actor, &key.action, &name))
            .collect()
    }

    fn resource_path(&self, actor: &str, action: &str, name: &str) -> String {
        let mut path = String::new();
        if !self.root.is_empty() {
            path.push_str(&self.root);
            path.push('/');
        }
        path.push_str(&format!("{}/{}/{}", actor, action, name));
        if !self.extension.is_empty() {
            path.push('.');
            path.push_str(&self.extension);
        }
        path
    }
}

/// Non-blank lines of a resource, trimmed.
pub fn content_variants(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Resolves semantic keys against a content store with per-key memoization.
///
/// The cache and random source are injected so callers can share one cache
/// across resolvers, isolate caches in tests, and make variant choice
/// reproducible.
#[derive(Clone)]
pub struct ContentResolver {
    loader: Arc<dyn ContentLoader>,
    cache: Arc<ContentCache>,
    random: Arc<dyn RandomSource>,
    config: ContentConfig,
}

impl ContentResolver {
    pub fn new(
        loader: Arc<dyn ContentLoader>,
        cache: Arc<ContentCache>,
        random: Arc<dyn RandomSource>,
        config: ContentConfig,
    ) -> Self {
        Self {
            loader,
            cache,
            random,
            config,
        }
    }

    /// Resolver with a fresh cache, thread-local randomness and the default
    /// layout.
    pub fn with_defaults(loader: Arc<dyn ContentLoader>) -> Self {
        Self::new(
            loader,
            Arc::new(ContentCache::new()),
            Arc::new(ThreadRandom),
            ContentConfig::default(),
        )
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Forget every memoized resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Resolve `semantic_key`, falling back to `original_text` verbatim when
    /// the key is unparsed or no candidate has content. Never fails.
    pub async fn resolve(&self, semantic_key: &str, original_text: &str) -> String {
        if let Some(hit) = self.cache.get(semantic_key) {
            debug!(key = semantic_key, "content cache hit");
            return hit;
        }

        self.cache
            .get_or_resolve(semantic_key, || self.resolve_uncached(semantic_key, original_text))
            .await
    }

    async fn resolve_uncached(&self, semantic_key: &str, original_text: &str) -> String {
        let Some(key) = SemanticKey::parse(semantic_key) else {
            debug!(key = semantic_key, "unparsed semantic key, using literal text");
            return original_text.to_string();
        };

        match self.search(&key).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(key = semantic_key, "no content candidate matched, using fallback");
                original_text.to_string()
            }
            Err(e) => {
                warn!(key = semantic_key, error = %e, "content store failed, using fallback");
                original_text.to_string()
            }
        }
    }

    /// Ordered, short-circuiting search over the fallback chain. Only a fatal
    /// loader error aborts it.
    async fn search(&self, key: &SemanticKey) -> Result<Option<String>, ContentError> {
        for path in self.config.candidate_paths(key) {
            match self.loader.load(&path).await {
                Ok(raw) => {
                    let variants = content_variants(&raw);
                    if variants.is_empty() {
                        debug!(path = %path, "content candidate is blank");
                        continue;
                    }
                    let index = self.random.pick(variants.len());
                    let chosen = variants.get(index).or(variants.first()).copied();
                    if let Some(text) = chosen {
                        debug!(
                            path = %path,
                            variants = variants.len(),
                            index,
                            "content candidate resolved"
                        );
                        return Ok(Some(text.to_string()));
                    }
                }
                Err(ContentError::NotFound(_)) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(path = %path, error = %e, "content candidate unreadable, trying next");
                }
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("cache_entries", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}
