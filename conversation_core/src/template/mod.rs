//! Template Engine - fills `{key}` and `{key|fallback}` placeholders from user
//! data.
//!
//! Each placeholder renders independently, left to right:
//! - a present, non-null value is stringified and substituted
//! - otherwise the fallback literal is substituted, if one was given
//! - otherwise the placeholder is left exactly as written
//!
//! Nothing is cached here; values are read fresh on every render.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

use crate::data::DataAccessor;

/// `{` up to the first following `}`.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// One placeholder occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte range of the whole `{...}` token.
    pub range: Range<usize>,
    /// Lookup key, trimmed.
    pub key: &'a str,
    /// Literal after the first `|`, trimmed. May be empty.
    pub fallback: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    fn parse(range: Range<usize>, inner: &'a str) -> Self {
        let (key, fallback) = match inner.split_once('|') {
            Some((key, fallback)) => (key, Some(fallback)),
            None => (inner, None),
        };
        Self {
            range,
            key: key.trim(),
            fallback: fallback.map(str::trim),
        }
    }
}

/// All placeholders in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<Placeholder<'_>> {
    placeholder_pattern()
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(Placeholder::parse(whole.range(), inner.as_str()))
        })
        .collect()
}

/// Display form of a user-data value. `None` for null.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(stringify)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Stateless placeholder renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render `template` against live user data.
    pub async fn render<A>(&self, template: &str, data: &A) -> String
    where
        A: DataAccessor + ?Sized,
    {
        let found = placeholders(template);
        if found.is_empty() {
            return template.to_string();
        }

        let mut values: HashMap<&str, Option<Value>> = HashMap::new();
        for placeholder in &found {
            if placeholder.key.is_empty() || values.contains_key(placeholder.key) {
                continue;
            }
            let value = data.get_value(placeholder.key).await;
            values.insert(placeholder.key, value);
        }

        self.render_with(template, |key| values.get(key).cloned().flatten())
    }

    /// Render `template` with a synchronous lookup.
    pub fn render_with<F>(&self, template: &str, mut lookup: F) -> String
    where
        F: FnMut(&str) -> Option<Value>,
    {
        let mut output = String::with_capacity(template.len());
        let mut cursor = 0;

        for placeholder in placeholders(template) {
            output.push_str(&template[cursor..placeholder.range.start]);

            let resolved = if placeholder.key.is_empty() {
                None
            } else {
                lookup(placeholder.key).as_ref().and_then(stringify)
            };

            match (resolved, placeholder.fallback) {
                (Some(text), _) => output.push_str(&text),
                (None, Some(fallback)) => output.push_str(fallback),
                (None, None) => output.push_str(&template[placeholder.range.clone()]),
            }

            cursor = placeholder.range.end;
        }

        output.push_str(&template[cursor..]);
        output
    }
}
