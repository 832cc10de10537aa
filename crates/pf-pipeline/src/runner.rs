//! Phase runner: the per-file decision loop.
//!
//! For each phase, in declared order:
//!
//! 1. skip if a prerequisite did not complete,
//! 2. skip if `skip_when` matches the file's metadata,
//! 3. skip if `run_if` does not hold,
//! 4. otherwise execute the phase's operations,
//! 5. on failure apply the effective error mode: `continue` records a
//!    failure and moves on, `stop` records a failure and halts the run,
//!    `skip` records the phase as skipped and moves on.
//!
//! The order matters: a dependency skip is reported as such even when
//! `skip_when` would also match, and `run_if` never masks a `skip_when`
//! reason.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use pf_core::{
    Error, FileProcessingResult, OutcomeTracker, PhaseResult, RunId, SkipReason,
};
use pf_rules::{OnErrorMode, PhaseDefinition};

use crate::context::{FileContext, PhaseProgress};
use crate::graph::SubsetWarning;
use crate::operation::OperationExecutor;
use crate::policy::ValidatedPolicy;

/// What the decision loop does after recording a phase.
enum Flow {
    Next,
    Halt { phase: String, error: String },
}

/// Runs a validated policy against files, one file per call.
///
/// Cheap to clone; the policy and executor are shared.
#[derive(Clone)]
pub struct PhaseRunner {
    policy: Arc<ValidatedPolicy>,
    executor: Arc<dyn OperationExecutor>,
    /// Indices of the phases to run, in policy order. `None` runs all.
    selected: Option<Vec<usize>>,
}

impl std::fmt::Debug for PhaseRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseRunner")
            .field("executor", &self.executor.name())
            .field("phases", &self.policy.phases().len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl PhaseRunner {
    pub fn new(policy: Arc<ValidatedPolicy>, executor: Arc<dyn OperationExecutor>) -> Self {
        Self {
            policy,
            executor,
            selected: None,
        }
    }

    pub fn policy(&self) -> &ValidatedPolicy {
        &self.policy
    }

    /// Restrict execution to the named phases.
    ///
    /// Phases still run in policy order regardless of the order given. A
    /// selected phase whose prerequisite is not selected is reported in the
    /// returned warnings; at run time it is skipped because the prerequisite
    /// never completes.
    pub fn with_selected_phases<S: AsRef<str>>(
        mut self,
        names: &[S],
    ) -> pf_core::Result<(Self, Vec<SubsetWarning>)> {
        let graph = self.policy.graph();
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let index = graph.index_of(name).ok_or_else(|| Error::UnknownPhase {
                name: name.to_string(),
                valid: graph.phase_names().to_vec(),
            })?;
            indices.push(index);
        }
        indices.sort_unstable();
        indices.dedup();

        let warnings = graph.validate_subset(names);
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        self.selected = Some(indices);
        Ok((self, warnings))
    }

    /// Phases this runner will consider, in policy order.
    pub fn phases(&self) -> Vec<&PhaseDefinition> {
        let all = self.policy.phases();
        match &self.selected {
            Some(indices) => indices.iter().map(|&i| &all[i]).collect(),
            None => all.iter().collect(),
        }
    }

    /// Run every phase against one file.
    pub async fn process_file(&self, ctx: &FileContext) -> FileProcessingResult {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let clock = Instant::now();
        let phases = self.phases();
        let total = phases.len();

        tracing::info!(
            file = %ctx.file_path.display(),
            run_id = %run_id,
            phases = total,
            "Processing file"
        );

        let mut tracker = OutcomeTracker::new();
        let mut halted: Option<(String, String)> = None;

        for (index, phase) in phases.into_iter().enumerate() {
            ctx.progress.send(&PhaseProgress {
                file: ctx.file_path.clone(),
                phase: phase.name.clone(),
                index,
                total,
            });

            let (result, flow) = match self.check_skip(phase, ctx, &tracker) {
                Some(reason) => {
                    tracing::info!(
                        file = %ctx.file_path.display(),
                        phase = %phase.name,
                        reason = %reason,
                        "Skipping phase"
                    );
                    (PhaseResult::skipped(&phase.name, reason), Flow::Next)
                }
                None => self.execute_phase(phase, ctx).await,
            };

            if let Err(e) = tracker.record(result).map_err(Error::from) {
                tracing::error!(phase = %phase.name, error = %e, "Outcome not recorded");
            }

            if let Flow::Halt { phase, error } = flow {
                halted = Some((phase, error));
                break;
            }
        }

        let summary = tracker.summary();
        let stopped_early = halted.is_some();
        let (failed_phase, error_message) = halted.unzip();
        let duration_ms = clock.elapsed().as_millis() as u64;

        tracing::info!(
            file = %ctx.file_path.display(),
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            modified = summary.modified,
            stopped_early,
            duration_ms,
            "File processed"
        );

        FileProcessingResult {
            run_id,
            file_path: ctx.file_path.clone(),
            started_at,
            duration_ms,
            success: !stopped_early,
            phase_results: tracker.into_results(),
            summary,
            failed_phase,
            error_message,
            stopped_early,
        }
    }

    /// Steps 1-3 of the decision loop. Returns the reason to skip, if any.
    fn check_skip(
        &self,
        phase: &PhaseDefinition,
        ctx: &FileContext,
        tracker: &OutcomeTracker,
    ) -> Option<SkipReason> {
        if let Some((dependency, outcome)) = self.policy.graph().first_unmet(&phase.name, tracker) {
            return Some(SkipReason::Dependency {
                dependency: dependency.to_string(),
                outcome,
            });
        }

        if let Some(condition) = &phase.skip_when {
            if let Some(matched) = condition.evaluate(&ctx.media_info) {
                return Some(matched.into_reason());
            }
        }

        if let Some(run_if) = &phase.run_if {
            if !run_if.evaluate(tracker) {
                return Some(run_if.skip_reason(tracker));
            }
        }

        None
    }

    /// Steps 4-5: run the operations and apply the error mode.
    async fn execute_phase(&self, phase: &PhaseDefinition, ctx: &FileContext) -> (PhaseResult, Flow) {
        let operations = phase.operations.keys();
        tracing::info!(
            file = %ctx.file_path.display(),
            phase = %phase.name,
            operations = ?operations,
            "Running phase"
        );

        let started = Instant::now();
        let outcome = self
            .executor
            .execute(&phase.name, &phase.operations, ctx)
            .await;
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                tracing::info!(
                    file = %ctx.file_path.display(),
                    phase = %phase.name,
                    modified = output.file_modified,
                    duration_ms = elapsed,
                    "Phase completed"
                );
                let result = PhaseResult::completed(&phase.name, output.file_modified)
                    .with_operations(operations)
                    .with_summary(output.summary)
                    .with_duration_ms(elapsed);
                (result, Flow::Next)
            }
            Err(e) => {
                let error = e.to_string();
                let mode = self.policy.effective_on_error(phase);
                match mode {
                    OnErrorMode::Continue => {
                        tracing::error!(
                            file = %ctx.file_path.display(),
                            phase = %phase.name,
                            error = %error,
                            "Phase failed; continuing"
                        );
                        let result = PhaseResult::failed(&phase.name, error)
                            .with_operations(operations)
                            .with_duration_ms(elapsed);
                        (result, Flow::Next)
                    }
                    OnErrorMode::Stop => {
                        tracing::error!(
                            file = %ctx.file_path.display(),
                            phase = %phase.name,
                            error = %error,
                            "Phase failed; stopping run"
                        );
                        let result = PhaseResult::failed(&phase.name, error.clone())
                            .with_operations(operations)
                            .with_duration_ms(elapsed);
                        let flow = Flow::Halt {
                            phase: phase.name.clone(),
                            error,
                        };
                        (result, flow)
                    }
                    OnErrorMode::Skip => {
                        tracing::warn!(
                            file = %ctx.file_path.display(),
                            phase = %phase.name,
                            error = %error,
                            "Phase failed; recording as skipped"
                        );
                        let result =
                            PhaseResult::skipped(&phase.name, SkipReason::ErrorMode { error })
                                .with_operations(operations)
                                .with_duration_ms(elapsed);
                        (result, Flow::Next)
                    }
                }
            }
        }
    }
}
