//! Positive run conditions on an earlier phase's outcome.

use std::fmt;

use pf_core::{OutcomeTracker, PhaseOutcome, RunIfRequirement, SkipReason};
use serde::{Deserialize, Serialize};

/// A phase's `run_if` block: exactly one reference to an earlier phase.
///
/// Written as `{ "phase_modified": "transcode" }` or
/// `{ "phase_completed": "transcode" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunIfCondition {
    /// Run only if the named phase completed and modified the file.
    PhaseModified(String),
    /// Run only if the named phase completed.
    PhaseCompleted(String),
}

impl RunIfCondition {
    /// The referenced phase name.
    pub fn reference(&self) -> &str {
        match self {
            Self::PhaseModified(p) | Self::PhaseCompleted(p) => p,
        }
    }

    pub fn requirement(&self) -> RunIfRequirement {
        match self {
            Self::PhaseModified(_) => RunIfRequirement::Modified,
            Self::PhaseCompleted(_) => RunIfRequirement::Completed,
        }
    }

    /// Whether the condition holds for the outcomes recorded so far.
    ///
    /// A referenced phase that was skipped, failed or never recorded did not
    /// modify the file and did not complete.
    pub fn evaluate(&self, tracker: &OutcomeTracker) -> bool {
        match self {
            Self::PhaseModified(p) => tracker.was_modified(p),
            Self::PhaseCompleted(p) => tracker.outcome(p) == PhaseOutcome::Completed,
        }
    }

    /// The reason recorded when [`evaluate`](Self::evaluate) returns false.
    pub fn skip_reason(&self, tracker: &OutcomeTracker) -> SkipReason {
        SkipReason::RunIf {
            phase: self.reference().to_string(),
            requirement: self.requirement(),
            outcome: tracker.outcome(self.reference()),
        }
    }
}

impl fmt::Display for RunIfCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.requirement(), self.reference())
    }
}
