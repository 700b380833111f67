//! Canonical shapes for user values whose stored form varies.

use serde::{Deserialize, Serialize};

use crate::error::{ScriptError, ScriptResult};

/// The two shapes `activeDays` is found in: a list of day numbers, or the same
/// list JSON-encoded into a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActiveDaysInput {
    List(Vec<i64>),
    Encoded(String),
}

/// Weekdays a task is active on, as day numbers `0..=6` (0 = Sunday),
/// sorted and without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ActiveDaysInput")]
pub struct ActiveDays(Vec<u8>);

impl ActiveDays {
    /// Build from day numbers, rejecting anything outside `0..=6`.
    pub fn from_days(days: impl IntoIterator<Item = i64>) -> ScriptResult<Self> {
        let mut canonical = Vec::new();
        for day in days {
            let day = u8::try_from(day)
                .ok()
                .filter(|d| *d <= 6)
                .ok_or_else(|| {
                    ScriptError::InvalidActiveDays(format!("day {} out of range", day))
                })?;
            canonical.push(day);
        }
        canonical.sort_unstable();
        canonical.dedup();
        Ok(Self(canonical))
    }

    pub fn days(&self) -> &[u8] {
        &self.0
    }

    pub fn is_active_on(&self, day: u8) -> bool {
        self.0.binary_search(&day).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl TryFrom<ActiveDaysInput> for ActiveDays {
    type Error = ScriptError;

    fn try_from(input: ActiveDaysInput) -> Result<Self, Self::Error> {
        match input {
            ActiveDaysInput::List(days) => Self::from_days(days),
            ActiveDaysInput::Encoded(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(Self::default());
                }
                let days: Vec<i64> = serde_json::from_str(trimmed).map_err(|e| {
                    ScriptError::InvalidActiveDays(format!("cannot decode '{}': {}", raw, e))
                })?;
                Self::from_days(days)
            }
        }
    }
}

impl TryFrom<serde_json::Value> for ActiveDays {
    type Error = ScriptError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let input: ActiveDaysInput = serde_json::from_value(value)
            .map_err(|e| ScriptError::InvalidActiveDays(e.to_string()))?;
        Self::try_from(input)
    }
}
