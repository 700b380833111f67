//! # Conversation Core
//!
//! The engine of the scripted conversation system. This crate walks the
//! sequences defined in `flow_script`, resolves semantic content keys into
//! varied phrasing, fills placeholders from live user data, and drives a
//! conversation from one user input to the next.
//!
//! ## Core Components
//!
//! - **traversal**: Batches messages from a start id until an interactive stop, a transition, or the end
//! - **content**: Semantic-key fallback chains, content loading, and a single-flight resolution cache
//! - **template**: `{key|fallback}` placeholder rendering against user data
//! - **data**: User data access, data actions, and auto-route evaluation
//! - **library**: Sequence loading and caching by id
//! - **orchestrator**: Sessions, input submission, and rendered output batches
//! - **config**: TOML-loadable engine configuration
//!
//! ## Design Philosophy
//!
//! - **Data-Driven**: Conversation structure lives in sequence files, not code
//! - **Never Blank**: Content lookups always produce text, falling back to what the script wrote
//! - **Fail Soft**: Malformed scripts surface as error results carrying partial output, never as hangs

pub mod config;
pub mod content;
pub mod data;
pub mod error;
pub mod library;
pub mod orchestrator;
pub mod template;
pub mod traversal;

pub use config::*;
pub use content::*;
pub use data::*;
pub use error::*;
pub use library::*;
pub use orchestrator::*;
pub use template::*;
pub use traversal::*;
