//! Semantic keys and the fallback chain derived from them.

use serde::{Deserialize, Serialize};

use super::ContentConfig;

/// Subject suffixes that name a broader category of phrasing. A subject maps
/// to one only at a `_` boundary: `task_completion` is generic `completion`,
/// `rename` stays `rename`.
pub const DEFAULT_GENERIC_SUFFIXES: &[&str] = &[
    "completion",
    "failure",
    "success",
    "error",
    "input",
    "name",
    "welcome",
    "save",
    "delete",
    "update",
    "create",
    "status",
    "selection",
    "permission",
    "creation",
    "modification",
];

/// Filename of the action-level catch-all candidate.
pub const DEFAULT_CANDIDATE: &str = "default";

/// A parsed `actor.action.subject[.modifier]*` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticKey {
    pub actor: String,
    pub action: String,
    pub subject: String,
    /// Ordered qualifiers, most significant first.
    pub modifiers: Vec<String>,
}

impl SemanticKey {
    /// Parse a dotted key. Fewer than three parts yields `None`, the
    /// "unparsed" state callers treat as literal text.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split('.');
        let actor = parts.next()?;
        let action = parts.next()?;
        let subject = parts.next()?;
        Some(Self {
            actor: actor.to_string(),
            action: action.to_string(),
            subject: subject.to_string(),
            modifiers: parts.map(str::to_string).collect(),
        })
    }

    /// Candidate filenames (without extension), most specific first.
    pub fn candidate_names(&self, generic_suffixes: &[impl AsRef<str>]) -> Vec<String> {
        let mut names = subject_candidates(&self.subject, &self.modifiers);

        let generic = extract_generic_subject_with(&self.subject, generic_suffixes);
        if generic != self.subject {
            names.extend(subject_candidates(generic, &self.modifiers));
        }

        names.push(DEFAULT_CANDIDATE.to_string());
        names
    }
}

impl std::fmt::Display for SemanticKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.actor, self.action, self.subject)?;
        for modifier in &self.modifiers {
            write!(f, ".{}", modifier)?;
        }
        Ok(())
    }
}

/// `subject_m1_..._mn`, then drop the last modifier down to one, then the bare
/// subject.
fn subject_candidates(subject: &str, modifiers: &[String]) -> Vec<String> {
    let mut names = Vec::with_capacity(modifiers.len() + 1);
    for len in (1..=modifiers.len()).rev() {
        let mut name = subject.to_string();
        for modifier in &modifiers[..len] {
            name.push('_');
            name.push_str(modifier);
        }
        names.push(name);
    }
    names.push(subject.to_string());
    names
}

/// Map a specific subject to its generic category using the default suffix
/// vocabulary. Returns the subject unchanged when no suffix applies.
pub fn extract_generic_subject(subject: &str) -> &str {
    extract_generic_subject_with(subject, DEFAULT_GENERIC_SUFFIXES)
}

/// Like [`extract_generic_subject`] with a caller-supplied vocabulary.
/// Suffixes are tried in order and must follow a `_`; a subject equal to a
/// suffix is already generic.
pub fn extract_generic_subject_with<'a>(
    subject: &'a str,
    suffixes: &'a [impl AsRef<str>],
) -> &'a str {
    suffixes
        .iter()
        .map(|suffix| suffix.as_ref())
        .find(|suffix| {
            subject
                .strip_suffix(*suffix)
                .is_some_and(|head| head.len() > 1 && head.ends_with('_'))
        })
        .unwrap_or(subject)
}

/// Full resource paths for a key's parts using the default layout
/// (`content/{actor}/{action}/{candidate}.txt`).
pub fn build_fallback_chain(
    actor: &str,
    action: &str,
    subject: &str,
    modifiers: &[&str],
) -> Vec<String> {
    let key = SemanticKey {
        actor: actor.to_string(),
        action: action.to_string(),
        subject: subject.to_string(),
        modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
    };
    ContentConfig::default().candidate_paths(&key)
}
