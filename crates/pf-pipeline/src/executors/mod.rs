//! Built-in [`OperationExecutor`] implementations.

mod command;
mod dry_run;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use command::{CommandExecutor, ExecStep};
pub use dry_run::DryRunExecutor;

use crate::operation::OperationExecutor;

/// Which built-in executor performs phase operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutorKind {
    /// Log operations without touching files.
    DryRun,
    /// Run the `exec` entries of each phase as external commands.
    #[default]
    Command,
}

impl ExecutorKind {
    /// Build the executor; `timeout` bounds each external command.
    pub fn build(self, timeout: Duration) -> Arc<dyn OperationExecutor> {
        match self {
            Self::DryRun => Arc::new(DryRunExecutor),
            Self::Command => Arc::new(CommandExecutor::new().with_timeout(timeout)),
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Command => write!(f, "command"),
        }
    }
}

impl FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dry-run" | "dryrun" => Ok(Self::DryRun),
            "command" => Ok(Self::Command),
            other => Err(format!("unknown executor '{other}' (expected dry-run or command)")),
        }
    }
}
