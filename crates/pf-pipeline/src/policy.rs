//! A policy that has passed every load-time check.

use pf_core::ValidationError;
use pf_rules::policy::check_skip_conditions;
use pf_rules::{OnErrorMode, PhaseDefinition, Policy};

use crate::graph::DependencyGraph;

/// Phases, their validated dependency graph and the policy's default error
/// mode. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPolicy {
    phases: Vec<PhaseDefinition>,
    graph: DependencyGraph,
    default_on_error: OnErrorMode,
}

impl ValidatedPolicy {
    /// Validate a phase list under an explicit default error mode.
    pub fn new(
        phases: Vec<PhaseDefinition>,
        default_on_error: OnErrorMode,
    ) -> Result<Self, ValidationError> {
        if phases.is_empty() {
            return Err(ValidationError::EmptyPolicy);
        }
        check_skip_conditions(&phases)?;
        let graph = DependencyGraph::build(&phases)?;

        tracing::debug!(
            phases = phases.len(),
            default_on_error = %default_on_error,
            "Policy validated"
        );

        Ok(Self {
            phases,
            graph,
            default_on_error,
        })
    }

    /// Validate a parsed policy document.
    ///
    /// `fallback` is used when the document does not set `config.on_error`.
    pub fn from_policy(policy: Policy, fallback: OnErrorMode) -> Result<Self, ValidationError> {
        policy.validate()?;
        let default = policy.config.on_error.unwrap_or(fallback);
        Self::new(policy.phases, default)
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseDefinition> {
        self.graph.index_of(name).map(|i| &self.phases[i])
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn default_on_error(&self) -> OnErrorMode {
        self.default_on_error
    }

    /// The phase's own `on_error`, or the policy default.
    pub fn effective_on_error(&self, phase: &PhaseDefinition) -> OnErrorMode {
        phase.effective_on_error(self.default_on_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pf_rules::SkipCondition;

    #[test]
    fn empty_phase_list_rejected() {
        assert_eq!(
            ValidatedPolicy::new(vec![], OnErrorMode::Continue).unwrap_err(),
            ValidationError::EmptyPolicy
        );
    }

    #[test]
    fn empty_skip_condition_rejected() {
        let phases = vec![PhaseDefinition::new("a").skip_when(SkipCondition::any(vec![]))];
        assert_matches!(
            ValidatedPolicy::new(phases, OnErrorMode::Continue),
            Err(ValidationError::EmptySkipCondition { phase }) if phase == "a"
        );
    }

    #[test]
    fn document_default_beats_fallback() {
        let policy = Policy::new(vec![PhaseDefinition::new("a")]).with_on_error(OnErrorMode::Skip);
        let validated = ValidatedPolicy::from_policy(policy, OnErrorMode::Stop).unwrap();
        assert_eq!(validated.default_on_error(), OnErrorMode::Skip);

        let policy = Policy::new(vec![PhaseDefinition::new("a")]);
        let validated = ValidatedPolicy::from_policy(policy, OnErrorMode::Stop).unwrap();
        assert_eq!(validated.default_on_error(), OnErrorMode::Stop);
    }

    #[test]
    fn phase_override_beats_default() {
        let policy = ValidatedPolicy::new(
            vec![
                PhaseDefinition::new("a").on_error(OnErrorMode::Continue),
                PhaseDefinition::new("b"),
            ],
            OnErrorMode::Stop,
        )
        .unwrap();
        let a = policy.phase("a").unwrap();
        let b = policy.phase("b").unwrap();
        assert_eq!(policy.effective_on_error(a), OnErrorMode::Continue);
        assert_eq!(policy.effective_on_error(b), OnErrorMode::Stop);
    }

    #[test]
    fn graph_errors_surface() {
        let phases = vec![
            PhaseDefinition::new("a").depends_on(["b"]),
            PhaseDefinition::new("b").depends_on(["a"]),
        ];
        assert_matches!(
            ValidatedPolicy::new(phases, OnErrorMode::Continue),
            Err(ValidationError::Cycle { .. })
        );
    }
}
