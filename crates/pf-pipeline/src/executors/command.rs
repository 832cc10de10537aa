//! Runs a phase's `exec` entries as external commands.
//!
//! ```toml
//! [[phases]]
//! name = "remux"
//!
//! [phases.operations]
//! exec = [
//!   { command = "mkvmerge", args = ["-o", "{dirname}/{filestem}.remux.mkv", "{input}"], modifies = true },
//! ]
//! ```

use std::time::Duration;

use async_trait::async_trait;
use pf_core::Error;
use pf_rules::Operations;
use serde::Deserialize;

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::context::FileContext;
use crate::operation::{OperationExecutor, OperationOutput};
use crate::template::TemplateContext;

const EXEC_KEY: &str = "exec";

/// One external command of a phase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecStep {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Whether a successful run of this command changes the file.
    #[serde(default)]
    pub modifies: bool,
}

/// Executes `exec` steps sequentially; the first failing step fails the
/// phase. Operation keys other than `exec` are ignored.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder: timeout applied to each command.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse the `exec` entries of a payload. A payload without `exec` has
    /// no steps.
    pub fn steps(phase: &str, operations: &Operations) -> pf_core::Result<Vec<ExecStep>> {
        match operations.get(EXEC_KEY) {
            None => Ok(Vec::new()),
            Some(value) => Vec::<ExecStep>::deserialize(value)
                .map_err(|e| Error::operation(phase, format!("invalid exec entries: {e}"))),
        }
    }
}

#[async_trait]
impl OperationExecutor for CommandExecutor {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn execute(
        &self,
        phase: &str,
        operations: &Operations,
        ctx: &FileContext,
    ) -> pf_core::Result<OperationOutput> {
        let steps = Self::steps(phase, operations)?;
        for key in operations.keys().into_iter().filter(|k| k != EXEC_KEY) {
            tracing::debug!(phase = %phase, operation = %key, "No command handler; ignoring");
        }

        if steps.is_empty() {
            return Ok(OperationOutput::unchanged().with_summary("no commands"));
        }

        let template = TemplateContext::for_file(ctx.path(), phase);
        let mut modified = false;
        let mut ran = Vec::with_capacity(steps.len());

        for step in &steps {
            let mut cmd = ToolCommand::new(template.substitute(&step.command));
            cmd.args(template.substitute_all(&step.args)).timeout(self.timeout);

            if ctx.dry_run {
                tracing::info!(phase = %phase, command = %cmd.display(), "[DRY RUN] Would execute");
                ran.push(cmd.tool_name());
                continue;
            }

            tracing::debug!(phase = %phase, command = %cmd.display(), "Executing");
            cmd.execute().await?;
            modified |= step.modifies;
            ran.push(cmd.tool_name());
        }

        let verb = if ctx.dry_run { "would execute" } else { "executed" };
        let output = if modified {
            OperationOutput::modified()
        } else {
            OperationOutput::unchanged()
        };
        Ok(output.with_summary(format!("{verb}: {}", ran.join(", "))))
    }
}
