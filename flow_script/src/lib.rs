//! # Flow Script
//!
//! The "Script Bible" crate - contains every definition a scripted conversation
//! is made of: messages, sequences, data actions and auto-route rules.
//! This crate is the single source of truth for script structure and does not
//! contain any traversal, templating or content logic.

pub mod actions;
pub mod error;
pub mod messages;
pub mod sequence;
pub mod values;

pub use actions::*;
pub use error::*;
pub use messages::*;
pub use sequence::*;
pub use values::*;
