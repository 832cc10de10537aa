//! # pf-pipeline
//!
//! The phase execution engine.
//!
//! A [`ValidatedPolicy`] is built once per policy: it owns the phase list and
//! its [`DependencyGraph`], and is shared read-only by every file's run. A
//! [`PhaseRunner`] walks the phases of one file in declared order, deciding
//! for each phase whether to run it:
//!
//! 1. dependency check ([`DependencyGraph::first_unmet`]),
//! 2. `skip_when` ([`pf_rules::SkipCondition::evaluate`]),
//! 3. `run_if` ([`pf_rules::RunIfCondition::evaluate`]),
//! 4. execute via an [`OperationExecutor`],
//! 5. apply the phase's effective error mode on failure.
//!
//! [`BatchRunner`] drives many files concurrently under one policy.

pub mod batch;
pub mod command;
pub mod context;
pub mod executors;
pub mod graph;
pub mod operation;
pub mod policy;
pub mod runner;
pub mod template;

pub use batch::{BatchResult, BatchRunner};
pub use command::{ToolCommand, ToolOutput};
pub use context::{FileContext, PhaseProgress, ProgressSender};
pub use executors::{CommandExecutor, DryRunExecutor, ExecutorKind};
pub use graph::{DependencyGraph, SubsetWarning};
pub use operation::{OperationExecutor, OperationOutput};
pub use policy::ValidatedPolicy;
pub use runner::PhaseRunner;
pub use template::TemplateContext;
