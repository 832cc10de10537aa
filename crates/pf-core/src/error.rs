//! Unified error type for phaseforged.
//!
//! Policy defects are described by [`ValidationError`] so callers can match on
//! the exact problem; every other failure funnels into [`Error`].

use std::fmt;

use crate::outcome::PhaseOutcome;

/// A fatal defect in a policy, detected once at load time before any file is
/// processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A `depends_on` entry names a phase that does not exist.
    #[error("unknown dependency: phase '{phase}' depends on unknown phase '{dependency}'")]
    UnknownDependency {
        /// The phase declaring the dependency.
        phase: String,
        /// The missing prerequisite.
        dependency: String,
    },

    /// A phase lists itself in `depends_on`.
    #[error("self-dependency: phase '{phase}' depends on itself")]
    SelfDependency {
        /// The offending phase.
        phase: String,
    },

    /// The dependency graph contains a cycle.
    #[error("circular dependency: {}", .path.join(" → "))]
    Cycle {
        /// Phases on the cycle, starting and ending with the same name.
        path: Vec<String>,
    },

    /// A `skip_when` block with no predicates.
    #[error("phase '{phase}': skip_when must specify at least one condition")]
    EmptySkipCondition {
        /// The offending phase.
        phase: String,
    },

    /// `run_if` names a phase that does not exist.
    #[error("phase '{phase}' run_if references unknown phase '{reference}'")]
    UnknownRunIfReference {
        /// The phase declaring the condition.
        phase: String,
        /// The referenced phase.
        reference: String,
    },

    /// `run_if` names a phase that is not strictly earlier in declared order.
    #[error(
        "forward reference: phase '{phase}' run_if references '{reference}', \
         which does not appear earlier in the policy"
    )]
    ForwardRunIfReference {
        /// The phase declaring the condition.
        phase: String,
        /// The referenced phase.
        reference: String,
    },

    /// Two phases share a name (compared case-insensitively).
    #[error("duplicate phase name '{name}' (collides with '{existing}')")]
    DuplicatePhase {
        /// The later declaration.
        name: String,
        /// The earlier declaration it collides with.
        existing: String,
    },

    /// A phase name that does not match the allowed pattern.
    #[error(
        "invalid phase name '{name}': must start with a letter and contain only \
         letters, digits, '-' or '_' (at most 64 characters)"
    )]
    InvalidPhaseName {
        /// The rejected name.
        name: String,
    },

    /// A phase name that collides with a policy document key.
    #[error("phase name '{name}' is reserved")]
    ReservedPhaseName {
        /// The rejected name.
        name: String,
    },

    /// A policy without phases.
    #[error("policy must define at least one phase")]
    EmptyPolicy,

    /// A threshold literal (size, duration, resolution) that cannot be parsed.
    #[error("invalid {kind} '{value}': {reason}")]
    InvalidThreshold {
        /// What kind of literal was expected.
        kind: &'static str,
        /// The literal as written.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ValidationError {
    /// Convenience constructor for [`ValidationError::InvalidThreshold`].
    pub fn invalid_threshold(
        kind: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidThreshold {
            kind,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Attempt to record a phase outcome that violates the write-once rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The phase already has a terminal outcome in this run.
    #[error("phase '{phase}' already recorded as {outcome}")]
    AlreadyRecorded {
        /// The phase name.
        phase: String,
        /// The outcome recorded first.
        outcome: PhaseOutcome,
    },

    /// Only terminal outcomes may be recorded.
    #[error("phase '{phase}' cannot be recorded as pending")]
    Pending {
        /// The phase name.
        phase: String,
    },
}

/// Unified error type covering all failure modes in phaseforged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The policy failed load-time validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A policy document could not be parsed.
    #[error("Policy error: {0}")]
    Policy(String),

    /// A phase subset named a phase the policy does not define.
    #[error("Unknown phase '{name}'. Valid phases: {}", .valid.join(", "))]
    UnknownPhase {
        /// The requested name.
        name: String,
        /// Every phase name in declared order.
        valid: Vec<String>,
    },

    /// The outcome tracker rejected a write.
    #[error("Outcome error: {0}")]
    Record(#[from] RecordError),

    /// Metadata for a file could not be obtained.
    #[error("Probe error: {0}")]
    Probe(String),

    /// An external tool returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A phase's operations failed.
    #[error("Operation error [{phase}]: {message}")]
    Operation {
        /// The phase whose operations failed.
        phase: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Process exit code the CLI should use for this error.
    ///
    /// Policy problems exit with `2` so scripts can tell a bad policy apart
    /// from a processing failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::Policy(_) | Error::UnknownPhase { .. } => 2,
            _ => 1,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Operation`].
    pub fn operation(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Operation {
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Policy`].
    pub fn policy(message: impl fmt::Display) -> Self {
        Error::Policy(message.to_string())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
