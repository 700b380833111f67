//! Engine configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::content::ContentConfig;
use crate::error::{FlowError, FlowResult};
use crate::orchestrator::OrchestratorConfig;
use crate::traversal::TraversalConfig;

/// Complete engine configuration. Every section and field is optional in the
/// TOML form and falls back to its default.
///
/// ```toml
/// [traversal]
/// max_steps = 100
///
/// [content]
/// root = "content"
/// extension = "txt"
///
/// [orchestrator]
/// entry_message_id = 1
/// max_hops = 16
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub traversal: TraversalConfig,
    pub content: ContentConfig,
    pub orchestrator: OrchestratorConfig,
}

impl FlowConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(toml_str: &str) -> FlowResult<Self> {
        let config: FlowConfig =
            toml::from_str(toml_str).map_err(|e| FlowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> FlowResult<()> {
        if self.traversal.max_steps == 0 {
            return Err(FlowError::Config(
                "traversal.max_steps must be at least 1".to_string(),
            ));
        }
        if self.orchestrator.max_hops == 0 {
            return Err(FlowError::Config(
                "orchestrator.max_hops must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
