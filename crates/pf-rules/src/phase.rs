//! Phase definitions and error-handling modes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::run_if::RunIfCondition;
use crate::skip::SkipCondition;

/// What to do when a phase's operations fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnErrorMode {
    /// Record the failure and move on to the next phase.
    #[default]
    Continue,
    /// Record the failure and halt the file's run.
    #[serde(alias = "fail")]
    Stop,
    /// Record the phase as skipped instead of failed and move on.
    Skip,
}

impl fmt::Display for OnErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Stop => write!(f, "stop"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// The opaque work payload of a phase.
///
/// Read from the phase's `operations` table and kept untouched for the
/// operation executor to interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operations(BTreeMap<String, Value>);

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Operation keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Operations {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One named phase of a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseDefinition {
    pub name: String,
    /// Skip the phase when this condition matches the file's metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_when: Option<SkipCondition>,
    /// Phases that must have completed before this one may run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if: Option<RunIfCondition>,
    /// Overrides the policy's default error mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<OnErrorMode>,
    /// Operation payloads, keyed by operation type.
    #[serde(default, skip_serializing_if = "Operations::is_empty")]
    pub operations: Operations,
}

impl PhaseDefinition {
    /// A phase with no conditions and no operations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skip_when: None,
            depends_on: Vec::new(),
            run_if: None,
            on_error: None,
            operations: Operations::new(),
        }
    }

    pub fn skip_when(mut self, condition: SkipCondition) -> Self {
        self.skip_when = Some(condition);
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn run_if(mut self, condition: RunIfCondition) -> Self {
        self.run_if = Some(condition);
        self
    }

    pub fn on_error(mut self, mode: OnErrorMode) -> Self {
        self.on_error = Some(mode);
        self
    }

    pub fn operation(mut self, key: impl Into<String>, value: Value) -> Self {
        self.operations = self.operations.with(key, value);
        self
    }

    /// The error mode in force for this phase under a policy default.
    pub fn effective_on_error(&self, default: OnErrorMode) -> OnErrorMode {
        self.on_error.unwrap_or(default)
    }
}
