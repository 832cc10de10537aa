//! Phase dependency graph.
//!
//! Built and validated once per policy, then shared read-only by every file's
//! run. Validation rejects unknown, self and cyclic `depends_on` references
//! and `run_if` references that do not point strictly backwards in declared
//! order.

use std::collections::HashMap;
use std::fmt;

use pf_core::{OutcomeTracker, PhaseOutcome, ValidationError};
use pf_rules::PhaseDefinition;

/// Index into the policy's phase list.
pub type PhaseIndex = usize;

/// DFS marking used by cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A selected phase whose prerequisite was left out of the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetWarning {
    pub phase: String,
    pub missing: String,
}

impl fmt::Display for SubsetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "phase '{}' depends on '{}', which is not selected; '{}' will be skipped \
             unless '{}' runs",
            self.phase, self.missing, self.phase, self.missing
        )
    }
}

/// Validated prerequisite graph over a policy's phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Phase names in declared order.
    names: Vec<String>,
    index_map: HashMap<String, PhaseIndex>,
    /// Prerequisites per phase, deduplicated, in the order written.
    dependencies: Vec<Vec<PhaseIndex>>,
    /// Phases depending on each phase.
    dependents: Vec<Vec<PhaseIndex>>,
}

impl DependencyGraph {
    /// Build and validate the graph for a phase list.
    pub fn build(phases: &[PhaseDefinition]) -> Result<Self, ValidationError> {
        let mut index_map = HashMap::with_capacity(phases.len());
        let mut folded: HashMap<String, &str> = HashMap::with_capacity(phases.len());
        for (i, phase) in phases.iter().enumerate() {
            if let Some(existing) = folded.insert(phase.name.to_lowercase(), &phase.name) {
                return Err(ValidationError::DuplicatePhase {
                    name: phase.name.clone(),
                    existing: existing.to_string(),
                });
            }
            index_map.insert(phase.name.clone(), i);
        }

        let mut dependencies = vec![Vec::new(); phases.len()];
        let mut dependents = vec![Vec::new(); phases.len()];
        for (i, phase) in phases.iter().enumerate() {
            for dep in &phase.depends_on {
                if *dep == phase.name {
                    return Err(ValidationError::SelfDependency {
                        phase: phase.name.clone(),
                    });
                }
                let Some(&d) = index_map.get(dep) else {
                    return Err(ValidationError::UnknownDependency {
                        phase: phase.name.clone(),
                        dependency: dep.clone(),
                    });
                };
                // Repeated entries are harmless; keep the first.
                if !dependencies[i].contains(&d) {
                    dependencies[i].push(d);
                    dependents[d].push(i);
                }
            }
        }

        let graph = Self {
            names: phases.iter().map(|p| p.name.clone()).collect(),
            index_map,
            dependencies,
            dependents,
        };

        graph.check_cycles()?;
        graph.check_run_if(phases)?;
        Ok(graph)
    }

    /// Three-color DFS over prerequisite edges, roots in declared order.
    fn check_cycles(&self) -> Result<(), ValidationError> {
        let mut colors = vec![Color::White; self.names.len()];
        let mut stack = Vec::new();
        for root in 0..self.names.len() {
            if colors[root] == Color::White {
                self.visit(root, &mut colors, &mut stack)?;
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        node: PhaseIndex,
        colors: &mut [Color],
        stack: &mut Vec<PhaseIndex>,
    ) -> Result<(), ValidationError> {
        colors[node] = Color::Gray;
        stack.push(node);

        for &next in &self.dependencies[node] {
            match colors[next] {
                Color::White => self.visit(next, colors, stack)?,
                Color::Gray => {
                    // Back edge: the cycle is the stack from `next` onwards.
                    let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|&n| self.names[n].clone()).collect();
                    path.push(self.names[next].clone());
                    return Err(ValidationError::Cycle { path });
                }
                Color::Black => {}
            }
        }

        stack.pop();
        colors[node] = Color::Black;
        Ok(())
    }

    fn check_run_if(&self, phases: &[PhaseDefinition]) -> Result<(), ValidationError> {
        for (i, phase) in phases.iter().enumerate() {
            let Some(run_if) = &phase.run_if else {
                continue;
            };
            let reference = run_if.reference();
            match self.index_map.get(reference) {
                None => {
                    return Err(ValidationError::UnknownRunIfReference {
                        phase: phase.name.clone(),
                        reference: reference.to_string(),
                    })
                }
                Some(&r) if r >= i => {
                    return Err(ValidationError::ForwardRunIfReference {
                        phase: phase.name.clone(),
                        reference: reference.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.index_map.contains_key(phase)
    }

    pub fn index_of(&self, phase: &str) -> Option<PhaseIndex> {
        self.index_map.get(phase).copied()
    }

    /// Phase names in declared order.
    pub fn phase_names(&self) -> &[String] {
        &self.names
    }

    /// Deduplicated prerequisites of a phase.
    pub fn prerequisites(&self, phase: &str) -> Vec<&str> {
        self.index_of(phase)
            .map(|i| {
                self.dependencies[i]
                    .iter()
                    .map(|&d| self.names[d].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Phases that list `phase` as a prerequisite.
    pub fn dependents(&self, phase: &str) -> Vec<&str> {
        self.index_of(phase)
            .map(|i| {
                self.dependents[i]
                    .iter()
                    .map(|&d| self.names[d].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first prerequisite of `phase` that has not completed, with its
    /// current outcome.
    pub fn first_unmet(&self, phase: &str, tracker: &OutcomeTracker) -> Option<(&str, PhaseOutcome)> {
        let i = self.index_of(phase)?;
        self.dependencies[i].iter().find_map(|&d| {
            let name = self.names[d].as_str();
            match tracker.outcome(name) {
                PhaseOutcome::Completed => None,
                outcome => Some((name, outcome)),
            }
        })
    }

    /// Whether every prerequisite of `phase` has completed.
    ///
    /// A skipped prerequisite is not satisfied.
    pub fn is_satisfied(&self, phase: &str, tracker: &OutcomeTracker) -> bool {
        self.first_unmet(phase, tracker).is_none()
    }

    /// Warnings for selected phases whose prerequisites were not selected.
    ///
    /// Names not in the graph are ignored.
    pub fn validate_subset<S: AsRef<str>>(&self, selected: &[S]) -> Vec<SubsetWarning> {
        let chosen: Vec<PhaseIndex> = selected
            .iter()
            .filter_map(|s| self.index_of(s.as_ref()))
            .collect();

        let mut warnings = Vec::new();
        for &i in &chosen {
            for &d in &self.dependencies[i] {
                if !chosen.contains(&d) {
                    warnings.push(SubsetWarning {
                        phase: self.names[i].clone(),
                        missing: self.names[d].clone(),
                    });
                }
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pf_core::{PhaseResult, SkipReason};
    use pf_rules::RunIfCondition;

    fn phase(name: &str, deps: &[&str]) -> PhaseDefinition {
        PhaseDefinition::new(name).depends_on(deps.iter().copied())
    }

    #[test]
    fn acyclic_graph_builds() {
        let graph = DependencyGraph::build(&[
            phase("normalize", &[]),
            phase("transcode", &["normalize"]),
            phase("verify", &["transcode", "normalize"]),
        ])
        .unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.prerequisites("verify"), vec!["transcode", "normalize"]);
        assert_eq!(graph.dependents("normalize"), vec!["transcode", "verify"]);
    }

    #[test]
    fn two_node_cycle_reports_path() {
        let err = DependencyGraph::build(&[phase("a", &["b"]), phase("b", &["a"])]).unwrap_err();
        assert_eq!(err, ValidationError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()]
        });
        assert_eq!(err.to_string(), "circular dependency: a → b → a");
    }

    #[test]
    fn cycle_path_excludes_tail_leading_into_it() {
        let err = DependencyGraph::build(&[
            phase("entry", &["x"]),
            phase("x", &["y"]),
            phase("y", &["z"]),
            phase("z", &["x"]),
        ])
        .unwrap_err();
        assert_matches!(err, ValidationError::Cycle { path } if path == ["x", "y", "z", "x"]);
    }

    #[test]
    fn self_dependency_rejected() {
        let err = DependencyGraph::build(&[phase("b", &["b"])]).unwrap_err();
        assert_eq!(err, ValidationError::SelfDependency { phase: "b".into() });
    }

    #[test]
    fn unknown_dependency_rejected() {
        let err = DependencyGraph::build(&[phase("verify", &["transcode"])]).unwrap_err();
        assert_matches!(err, ValidationError::UnknownDependency { dependency, .. } if dependency == "transcode");
    }

    #[test]
    fn duplicate_dependency_is_harmless() {
        let graph = DependencyGraph::build(&[phase("a", &[]), phase("b", &["a", "a"])]).unwrap();
        assert_eq!(graph.prerequisites("b"), vec!["a"]);
        assert_eq!(graph.dependents("a"), vec!["b"]);
    }

    #[test]
    fn duplicate_phase_rejected() {
        let err = DependencyGraph::build(&[phase("Tag", &[]), phase("tag", &[])]).unwrap_err();
        assert_matches!(err, ValidationError::DuplicatePhase { .. });
    }

    #[test]
    fn later_dependency_is_allowed() {
        let graph = DependencyGraph::build(&[phase("a", &["b"]), phase("b", &[])]).unwrap();
        let tracker = OutcomeTracker::new();
        assert_eq!(graph.first_unmet("a", &tracker), Some(("b", PhaseOutcome::Pending)));
    }

    #[test]
    fn run_if_must_reference_earlier_phase() {
        let forward = [
            PhaseDefinition::new("a").run_if(RunIfCondition::PhaseModified("b".into())),
            PhaseDefinition::new("b"),
        ];
        assert_matches!(
            DependencyGraph::build(&forward),
            Err(ValidationError::ForwardRunIfReference { .. })
        );

        let own = [PhaseDefinition::new("a").run_if(RunIfCondition::PhaseCompleted("a".into()))];
        assert_matches!(
            DependencyGraph::build(&own),
            Err(ValidationError::ForwardRunIfReference { .. })
        );

        let unknown = [PhaseDefinition::new("a").run_if(RunIfCondition::PhaseModified("zz".into()))];
        assert_matches!(
            DependencyGraph::build(&unknown),
            Err(ValidationError::UnknownRunIfReference { .. })
        );
    }

    #[test]
    fn skipped_dependency_is_unmet() {
        let graph = DependencyGraph::build(&[phase("a", &[]), phase("b", &["a"])]).unwrap();
        let mut tracker = OutcomeTracker::new();
        tracker
            .record(PhaseResult::skipped(
                "a",
                SkipReason::ErrorMode {
                    error: "x".into(),
                },
            ))
            .unwrap();
        assert!(!graph.is_satisfied("b", &tracker));
        assert_eq!(graph.first_unmet("b", &tracker), Some(("a", PhaseOutcome::Skipped)));
        assert!(graph.is_satisfied("a", &tracker));
    }

    #[test]
    fn completed_dependency_is_met() {
        let graph = DependencyGraph::build(&[phase("a", &[]), phase("b", &["a"])]).unwrap();
        let mut tracker = OutcomeTracker::new();
        tracker.record(PhaseResult::completed("a", false)).unwrap();
        assert!(graph.is_satisfied("b", &tracker));
    }

    #[test]
    fn subset_warnings_name_missing_prerequisites() {
        let graph = DependencyGraph::build(&[
            phase("normalize", &[]),
            phase("transcode", &["normalize"]),
            phase("verify", &["transcode"]),
        ])
        .unwrap();

        let warnings = graph.validate_subset(&["transcode"]);
        assert_eq!(
            warnings,
            vec![SubsetWarning {
                phase: "transcode".into(),
                missing: "normalize".into(),
            }]
        );
        assert!(graph.validate_subset(&["normalize", "transcode"]).is_empty());
        assert!(graph.validate_subset(&["nope"]).is_empty());
    }

    #[test]
    fn validation_is_idempotent() {
        let phases = [phase("a", &[]), phase("b", &["a"]), phase("c", &["a", "b"])];
        assert_eq!(
            DependencyGraph::build(&phases).unwrap(),
            DependencyGraph::build(&phases).unwrap()
        );

        let cyclic = [phase("a", &["c"]), phase("b", &["a"]), phase("c", &["b"])];
        assert_eq!(
            DependencyGraph::build(&cyclic).unwrap_err(),
            DependencyGraph::build(&cyclic).unwrap_err()
        );
    }
}
