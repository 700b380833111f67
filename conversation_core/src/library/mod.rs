//! Sequence library - loads named sequences and keeps them for the lifetime
//! of an activation.

use async_trait::async_trait;
use dashmap::DashMap;
use flow_script::{Sequence, SequenceId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::error::{FlowError, FlowResult};

/// Where sequence definitions come from.
#[async_trait]
pub trait SequenceSource: Send + Sync {
    async fn load_sequence(&self, id: &SequenceId) -> FlowResult<Sequence>;
}

/// Sequences held in memory, e.g. compiled into the application.
#[derive(Debug, Default)]
pub struct InMemorySequenceSource {
    sequences: HashMap<SequenceId, Sequence>,
}

impl InMemorySequenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sequence under its own id.
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.insert(sequence.id().clone(), sequence);
        self
    }
}

#[async_trait]
impl SequenceSource for InMemorySequenceSource {
    async fn load_sequence(&self, id: &SequenceId) -> FlowResult<Sequence> {
        self.sequences
            .get(id)
            .cloned()
            .ok_or_else(|| FlowError::UnknownSequence(id.clone()))
    }
}

/// Sequences stored as `{dir}/{name}.json`.
#[derive(Debug, Clone)]
pub struct FsSequenceSource {
    dir: PathBuf,
}

impl FsSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SequenceSource for FsSequenceSource {
    async fn load_sequence(&self, id: &SequenceId) -> FlowResult<Sequence> {
        if id.as_str().is_empty() || id.as_str().contains(['/', '\\', '.']) {
            return Err(FlowError::UnknownSequence(id.clone()));
        }

        let path = self.dir.join(format!("{}.json", id));
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FlowError::UnknownSequence(id.clone()));
            }
            Err(e) => {
                return Err(FlowError::SequenceLoad {
                    sequence: id.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let sequence = Sequence::from_json_str(&json)?;
        if sequence.id() != id {
            return Err(FlowError::SequenceLoad {
                sequence: id.clone(),
                reason: format!("file declares id '{}'", sequence.id()),
            });
        }
        Ok(sequence)
    }
}

/// Loads each sequence once and hands out shared, immutable copies.
#[derive(Clone)]
pub struct SequenceLibrary {
    source: Arc<dyn SequenceSource>,
    loaded: Arc<DashMap<SequenceId, Arc<Sequence>>>,
}

impl SequenceLibrary {
    pub fn new(source: Arc<dyn SequenceSource>) -> Self {
        Self {
            source,
            loaded: Arc::new(DashMap::new()),
        }
    }

    /// The sequence named `id`, loading it on first use.
    pub async fn get(&self, id: &SequenceId) -> FlowResult<Arc<Sequence>> {
        if let Some(sequence) = self.loaded.get(id) {
            return Ok(sequence.clone());
        }

        let sequence = Arc::new(self.source.load_sequence(id).await?);
        debug!(sequence = %id, messages = sequence.len(), "sequence loaded");
        self.loaded.insert(id.clone(), sequence.clone());
        Ok(sequence)
    }

    /// Drop any loaded copy of `id` and load it again.
    pub async fn reload(&self, id: &SequenceId) -> FlowResult<Arc<Sequence>> {
        self.loaded.remove(id);
        self.get(id).await
    }

    pub fn is_loaded(&self, id: &SequenceId) -> bool {
        self.loaded.contains_key(id)
    }
}

impl std::fmt::Debug for SequenceLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceLibrary")
            .field("loaded", &self.loaded.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_script::Message;

    fn welcome() -> Sequence {
        Sequence::from_messages("welcome", vec![Message::text(1, "Hi")]).unwrap()
    }

    #[tokio::test]
    async fn test_library_caches_loaded_sequences() {
        let source = InMemorySequenceSource::new().with_sequence(welcome());
        let library = SequenceLibrary::new(Arc::new(source));
        let id = SequenceId::new("welcome");

        assert!(!library.is_loaded(&id));
        let first = library.get(&id).await.unwrap();
        assert!(library.is_loaded(&id));
        let second = library.get(&id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let reloaded = library.reload(&id).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
    }

    #[tokio::test]
    async fn test_unknown_sequence() {
        let library = SequenceLibrary::new(Arc::new(InMemorySequenceSource::new()));
        let err = library.get(&SequenceId::new("nope")).await.unwrap_err();
        assert!(matches!(err, FlowError::UnknownSequence(_)));
    }

    #[tokio::test]
    async fn test_fs_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("welcome.json"),
            r#"{"id": "welcome", "messages": [{"id": 1, "type": "text", "text": "Hi"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(
            dir.path().join("mislabeled.json"),
            r#"{"id": "other", "messages": [{"id": 1, "text": "Hi"}]}"#,
        )
        .unwrap();

        let source = FsSequenceSource::new(dir.path());

        let sequence = source.load_sequence(&"welcome".into()).await.unwrap();
        assert_eq!(sequence.len(), 1);

        assert!(matches!(
            source.load_sequence(&"missing".into()).await,
            Err(FlowError::UnknownSequence(_))
        ));
        assert!(matches!(
            source.load_sequence(&"broken".into()).await,
            Err(FlowError::Script(_))
        ));
        assert!(matches!(
            source.load_sequence(&"mislabeled".into()).await,
            Err(FlowError::SequenceLoad { .. })
        ));
        assert!(matches!(
            source.load_sequence(&"../welcome".into()).await,
            Err(FlowError::UnknownSequence(_))
        ));
    }
}
