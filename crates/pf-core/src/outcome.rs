//! Phase outcomes and per-file results.
//!
//! Everything in this module is owned by a single file's run and is designed
//! to serialize directly into the JSON handed to result sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::ids::RunId;

/// State of a phase within one file's run.
///
/// `Pending` is the implicit state of every phase that has not been recorded;
/// the other three are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseOutcome {
    #[default]
    Pending,
    Completed,
    Failed,
    Skipped,
}

impl PhaseOutcome {
    /// Whether the outcome is final.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// What a `run_if` condition asked of the referenced phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunIfRequirement {
    /// The phase must have completed and modified the file.
    Modified,
    /// The phase must have completed.
    Completed,
}

impl fmt::Display for RunIfRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => write!(f, "phase_modified"),
            Self::Completed => write!(f, "phase_completed"),
        }
    }
}

/// Why a phase was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipReason {
    /// A `skip_when` predicate matched.
    Condition {
        /// Predicate name, e.g. `video_codec`.
        condition: String,
        /// The metadata value that triggered the match.
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// A prerequisite did not complete.
    Dependency {
        dependency: String,
        outcome: PhaseOutcome,
    },
    /// The `run_if` condition did not hold.
    RunIf {
        phase: String,
        requirement: RunIfRequirement,
        outcome: PhaseOutcome,
    },
    /// The phase failed under `on_error: skip`.
    ErrorMode { error: String },
}

impl SkipReason {
    /// Human-readable explanation, suitable for logs and tables.
    pub fn message(&self) -> String {
        match self {
            Self::Condition {
                condition,
                value,
                detail,
            } => match detail {
                Some(detail) => format!("condition '{condition}' matched '{value}' ({detail})"),
                None => format!("condition '{condition}' matched '{value}'"),
            },
            Self::Dependency {
                dependency,
                outcome,
            } => format!("dependency '{dependency}' did not complete (outcome: {outcome})"),
            Self::RunIf {
                phase,
                requirement: RunIfRequirement::Modified,
                outcome: PhaseOutcome::Completed,
            } => format!("'{phase}' made no modifications"),
            Self::RunIf { phase, outcome, .. } => {
                format!("'{phase}' did not complete (outcome: {outcome})")
            }
            Self::ErrorMode { error } => format!("error-mode skip: {error}"),
        }
    }

    /// The JSON discriminator for this reason.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Condition { .. } => "condition",
            Self::Dependency { .. } => "dependency",
            Self::RunIf { .. } => "run_if",
            Self::ErrorMode { .. } => "error_mode",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// The recorded result of one phase for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: String,
    pub outcome: PhaseOutcome,
    #[serde(default)]
    pub file_modified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Operation keys handed to the executor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
    /// Optional one-line summary reported by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl PhaseResult {
    fn new(phase: impl Into<String>, outcome: PhaseOutcome) -> Self {
        Self {
            phase: phase.into(),
            outcome,
            file_modified: false,
            skip_reason: None,
            error: None,
            operations: Vec::new(),
            summary: None,
            duration_ms: 0,
        }
    }

    pub fn completed(phase: impl Into<String>, file_modified: bool) -> Self {
        Self {
            file_modified,
            ..Self::new(phase, PhaseOutcome::Completed)
        }
    }

    pub fn failed(phase: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(phase, PhaseOutcome::Failed)
        }
    }

    pub fn skipped(phase: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            skip_reason: Some(reason),
            ..Self::new(phase, PhaseOutcome::Skipped)
        }
    }

    pub fn with_operations(mut self, operations: Vec<String>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Skip reason or error, whichever applies, as display text.
    pub fn detail(&self) -> Option<String> {
        self.skip_reason
            .as_ref()
            .map(SkipReason::message)
            .or_else(|| self.error.clone())
    }
}

/// Counts of recorded outcomes in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Completed phases that reported a modification.
    pub modified: usize,
}

impl PhaseSummary {
    /// Tally a sequence of results.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a PhaseResult>) -> Self {
        results.into_iter().fold(Self::default(), |mut acc, r| {
            match r.outcome {
                PhaseOutcome::Completed => {
                    acc.completed += 1;
                    if r.file_modified {
                        acc.modified += 1;
                    }
                }
                PhaseOutcome::Failed => acc.failed += 1,
                PhaseOutcome::Skipped => acc.skipped += 1,
                PhaseOutcome::Pending => {}
            }
            acc
        })
    }

    /// Total recorded phases.
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.skipped
    }
}

/// Aggregate result of running a policy against one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProcessingResult {
    pub run_id: RunId,
    pub file_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// False iff a stop-mode failure halted the run.
    pub success: bool,
    pub phase_results: Vec<PhaseResult>,
    pub summary: PhaseSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub stopped_early: bool,
}

impl FileProcessingResult {
    /// Look up the result for a phase by name.
    pub fn phase(&self, name: &str) -> Option<&PhaseResult> {
        self.phase_results.iter().find(|r| r.phase == name)
    }

    /// Outcome of a phase, `Pending` if it was never recorded.
    pub fn outcome(&self, name: &str) -> PhaseOutcome {
        self.phase(name).map(|r| r.outcome).unwrap_or_default()
    }

    /// Number of phases that modified the file.
    pub fn phases_modified(&self) -> usize {
        self.summary.modified
    }
}
