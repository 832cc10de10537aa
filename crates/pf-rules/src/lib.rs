//! # pf-rules
//!
//! The declarative side of a phaseforged policy.
//!
//! ## Overview
//!
//! - [`SkipCondition`] -- a closed set of predicates over a file's metadata
//!   snapshot, OR-combined by default, answering "should this phase be
//!   skipped?".
//! - [`RunIfCondition`] -- a positive condition on an earlier phase's
//!   recorded outcome.
//! - [`PhaseDefinition`] -- one named phase: its conditions, prerequisites,
//!   error-mode override and opaque operations payload.
//! - [`Policy`] -- the ordered phase list plus policy-wide configuration,
//!   loaded from JSON or TOML.

pub mod phase;
pub mod policy;
pub mod run_if;
pub mod skip;

pub use phase::{OnErrorMode, Operations, PhaseDefinition};
pub use policy::{Policy, PolicyConfig};
pub use run_if::RunIfCondition;
pub use skip::{SkipCondition, SkipMatch, SkipMode, SkipPredicate};

/// Serialize a policy to a pretty-printed JSON string.
pub fn policy_to_json(policy: &Policy) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(policy)
}
