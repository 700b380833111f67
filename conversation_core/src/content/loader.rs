//! Content resource loaders.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Failures reading a content resource.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content resource '{0}' not found")]
    NotFound(String),

    /// A single resource could not be read. The search moves on.
    #[error("content resource '{path}' unavailable: {reason}")]
    Unavailable { path: String, reason: String },

    /// The resource layer as a whole is broken. The search stops.
    #[error("content store failure: {0}")]
    Fatal(String),
}

impl ContentError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ContentError::Fatal(_))
    }
}

/// Reads raw text resources by relative path
/// (e.g. `content/bot/acknowledge/completion.txt`).
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, path: &str) -> Result<String, ContentError>;
}

/// Loader over an in-process map of path to text.
#[derive(Debug, Default)]
pub struct MemoryContentLoader {
    resources: HashMap<String, String>,
    loads: AtomicUsize,
}

impl MemoryContentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    pub fn with_resource(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.resources.insert(path.into(), text.into());
        self
    }

    /// Number of `load` calls served so far, found or not.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentLoader for MemoryContentLoader {
    async fn load(&self, path: &str) -> Result<String, ContentError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(path.to_string()))
    }
}

/// Loader reading resources from a base directory on disk.
#[derive(Debug, Clone)]
pub struct FsContentLoader {
    base_dir: PathBuf,
}

impl FsContentLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl ContentLoader for FsContentLoader {
    async fn load(&self, path: &str) -> Result<String, ContentError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ContentError::Unavailable {
                path: path.to_string(),
                reason: "path escapes the content directory".to_string(),
            });
        }

        match tokio::fs::read_to_string(self.base_dir.join(relative)).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if tokio::fs::metadata(&self.base_dir).await.is_err() {
                    return Err(ContentError::Fatal(format!(
                        "content directory '{}' is missing",
                        self.base_dir.display()
                    )));
                }
                Err(ContentError::NotFound(path.to_string()))
            }
            Err(e) => Err(ContentError::Unavailable {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_loader() {
        let loader = MemoryContentLoader::new().with_resource("content/a/b/c.txt", "hello");

        assert_eq!(loader.load("content/a/b/c.txt").await.unwrap(), "hello");
        assert!(matches!(
            loader.load("content/a/b/missing.txt").await,
            Err(ContentError::NotFound(_))
        ));
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test]
    async fn test_fs_loader_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("content/bot/greet");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("welcome.txt"), "Hey!\nHello!").unwrap();

        let loader = FsContentLoader::new(dir.path());
        let text = loader.load("content/bot/greet/welcome.txt").await.unwrap();
        assert_eq!(text, "Hey!\nHello!");

        let missing = loader.load("content/bot/greet/nope.txt").await;
        assert!(matches!(missing, Err(ContentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fs_loader_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsContentLoader::new(dir.path().join("does-not-exist"));

        let err = loader.load("content/bot/greet/welcome.txt").await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_fs_loader_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsContentLoader::new(dir.path());

        let err = loader.load("../secrets.txt").await.unwrap_err();
        assert!(matches!(err, ContentError::Unavailable { .. }));
    }
}
