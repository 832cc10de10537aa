//! pf-core: shared types, IDs, errors, media helpers, and phase outcomes.
//!
//! This crate is the foundational dependency for all other pf-* crates,
//! providing a unified error type, the policy validation taxonomy, typed
//! run identifiers, media-domain matching helpers, threshold literals, and
//! the per-file outcome model written by the phase runner.

pub mod error;
pub mod ids;
pub mod media;
pub mod outcome;
pub mod tracker;
pub mod units;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, RecordError, Result, ValidationError};
pub use ids::*;
pub use outcome::{
    FileProcessingResult, PhaseOutcome, PhaseResult, PhaseSummary, RunIfRequirement, SkipReason,
};
pub use tracker::OutcomeTracker;
pub use media::Resolution;
pub use units::{ByteSize, Timespan};
