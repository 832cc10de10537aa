//! The [`OperationExecutor`] trait: the seam between the engine and the work
//! a phase performs.

use async_trait::async_trait;
use pf_rules::Operations;

use crate::context::FileContext;

/// Result of a phase's operations that ran successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutput {
    /// Whether the operations changed the file.
    pub file_modified: bool,
    /// Human-readable summary of what was done.
    pub summary: Option<String>,
}

impl OperationOutput {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn modified() -> Self {
        Self {
            file_modified: true,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Performs the operations payload of a phase.
///
/// The engine never interprets `operations`; it hands the payload over
/// verbatim and records the outcome. An `Err` is a phase failure, handled
/// according to the phase's effective error mode.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// A short, human-readable name for this executor (e.g. "dry-run").
    fn name(&self) -> &'static str;

    /// Run `operations` for `phase` against the file in `ctx`.
    async fn execute(
        &self,
        phase: &str,
        operations: &Operations,
        ctx: &FileContext,
    ) -> pf_core::Result<OperationOutput>;
}
