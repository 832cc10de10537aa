//! Write-once record of phase outcomes for one file's run.

use std::collections::HashMap;

use crate::error::RecordError;
use crate::outcome::{PhaseOutcome, PhaseResult, PhaseSummary};

/// Per-file map of phase name to recorded [`PhaseResult`].
///
/// Results are kept in recording order. A phase can be recorded at most once,
/// and only with a terminal outcome; any phase not yet recorded reads as
/// [`PhaseOutcome::Pending`].
#[derive(Debug, Default, Clone)]
pub struct OutcomeTracker {
    results: Vec<PhaseResult>,
    index: HashMap<String, usize>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a phase's terminal result.
    pub fn record(&mut self, result: PhaseResult) -> Result<(), RecordError> {
        if !result.outcome.is_terminal() {
            return Err(RecordError::Pending {
                phase: result.phase,
            });
        }
        if let Some(&i) = self.index.get(&result.phase) {
            return Err(RecordError::AlreadyRecorded {
                phase: result.phase,
                outcome: self.results[i].outcome,
            });
        }
        self.index.insert(result.phase.clone(), self.results.len());
        self.results.push(result);
        Ok(())
    }

    pub fn outcome(&self, phase: &str) -> PhaseOutcome {
        self.get(phase).map(|r| r.outcome).unwrap_or_default()
    }

    /// Whether the phase completed and reported a modification.
    pub fn was_modified(&self, phase: &str) -> bool {
        self.get(phase)
            .is_some_and(|r| r.outcome == PhaseOutcome::Completed && r.file_modified)
    }

    pub fn get(&self, phase: &str) -> Option<&PhaseResult> {
        self.index.get(phase).map(|&i| &self.results[i])
    }

    pub fn results(&self) -> &[PhaseResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<PhaseResult> {
        self.results
    }

    pub fn summary(&self) -> PhaseSummary {
        PhaseSummary::from_results(&self.results)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::SkipReason;
    use assert_matches::assert_matches;

    #[test]
    fn unrecorded_phase_is_pending() {
        let tracker = OutcomeTracker::new();
        assert_eq!(tracker.outcome("anything"), PhaseOutcome::Pending);
        assert!(!tracker.was_modified("anything"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn record_is_write_once() {
        let mut tracker = OutcomeTracker::new();
        tracker.record(PhaseResult::completed("a", true)).unwrap();

        let err = tracker.record(PhaseResult::failed("a", "late")).unwrap_err();
        assert_matches!(
            err,
            RecordError::AlreadyRecorded {
                outcome: PhaseOutcome::Completed,
                ..
            }
        );
        assert_eq!(tracker.outcome("a"), PhaseOutcome::Completed);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn pending_cannot_be_recorded() {
        let mut tracker = OutcomeTracker::new();
        let mut result = PhaseResult::completed("a", false);
        result.outcome = PhaseOutcome::Pending;
        assert_matches!(tracker.record(result), Err(RecordError::Pending { .. }));
        assert!(tracker.is_empty());
    }

    #[test]
    fn modification_requires_completion() {
        let mut tracker = OutcomeTracker::new();
        tracker.record(PhaseResult::completed("a", true)).unwrap();
        tracker.record(PhaseResult::completed("b", false)).unwrap();
        let mut failed = PhaseResult::failed("c", "boom");
        failed.file_modified = true;
        tracker.record(failed).unwrap();

        assert!(tracker.was_modified("a"));
        assert!(!tracker.was_modified("b"));
        assert!(!tracker.was_modified("c"));
    }

    #[test]
    fn results_keep_recording_order() {
        let mut tracker = OutcomeTracker::new();
        tracker.record(PhaseResult::completed("z", false)).unwrap();
        tracker
            .record(PhaseResult::skipped(
                "a",
                SkipReason::ErrorMode {
                    error: "x".into(),
                },
            ))
            .unwrap();
        let names: Vec<_> = tracker.results().iter().map(|r| r.phase.as_str()).collect();
        assert_eq!(names, ["z", "a"]);
        assert_eq!(tracker.summary().skipped, 1);
    }
}
