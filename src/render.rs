//! Human and JSON rendering for CLI output.

use std::fmt::Write as _;

use pf_core::{FileProcessingResult, PhaseOutcome, PhaseResult};
use pf_pipeline::{BatchResult, ValidatedPolicy};

/// The ordered phase table printed by `phaseforged phases`.
pub fn phases_table(policy: &ValidatedPolicy) -> String {
    let width = name_width(policy.phases().iter().map(|p| p.name.as_str()));
    let mut out = String::new();

    let _ = writeln!(out, "  #  {:<width$}  {:<8}  DETAILS", "PHASE", "ON ERROR");
    for (i, phase) in policy.phases().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<width$}  {:<8}  {}",
            i + 1,
            phase.name,
            policy.effective_on_error(phase).to_string(),
            operations_label(&phase.operations.keys()),
        );
        if !phase.depends_on.is_empty() {
            let _ = writeln!(out, "     {:width$}  depends on: {}", "", phase.depends_on.join(", "));
        }
        if let Some(skip) = &phase.skip_when {
            let _ = writeln!(
                out,
                "     {:width$}  skip when ({}): {}",
                "",
                skip.mode(),
                skip.describe()
            );
        }
        if let Some(run_if) = &phase.run_if {
            let _ = writeln!(out, "     {:width$}  run if: {run_if}", "");
        }
    }
    out
}

fn operations_label(keys: &[String]) -> String {
    if keys.is_empty() {
        "(no operations)".to_string()
    } else {
        format!("operations: {}", keys.join(", "))
    }
}

/// Per-file report: a header line plus one line per recorded phase.
pub fn file_report(result: &FileProcessingResult) -> String {
    let mut out = String::new();
    let status = if result.success { "✓" } else { "✗" };
    let s = &result.summary;

    let _ = writeln!(
        out,
        "{status} {} ({} completed, {} failed, {} skipped, {} modified) in {}ms",
        result.file_path.display(),
        s.completed,
        s.failed,
        s.skipped,
        s.modified,
        result.duration_ms,
    );

    let width = name_width(result.phase_results.iter().map(|r| r.phase.as_str()));
    for phase in &result.phase_results {
        let _ = writeln!(
            out,
            "    {:<width$}  {:<9}  {}",
            phase.phase,
            phase.outcome.to_string(),
            phase_detail(phase)
        );
    }

    if let Some(error) = &result.error_message {
        match &result.failed_phase {
            Some(phase) => {
                let _ = writeln!(out, "    stopped at '{phase}': {error}");
            }
            None => {
                let _ = writeln!(out, "    error: {error}");
            }
        }
    }
    out
}

fn phase_detail(phase: &PhaseResult) -> String {
    match phase.outcome {
        PhaseOutcome::Completed => {
            let state = if phase.file_modified { "modified" } else { "unchanged" };
            match &phase.summary {
                Some(summary) => format!("{state}; {summary}"),
                None => state.to_string(),
            }
        }
        _ => phase.detail().unwrap_or_default(),
    }
}

/// Report for a whole batch, ending with a totals line.
pub fn batch_report(batch: &BatchResult) -> String {
    let mut out = String::new();
    for result in &batch.results {
        out.push_str(&file_report(result));
    }
    for path in &batch.not_started {
        let _ = writeln!(out, "- {} (not started)", path.display());
    }

    let _ = writeln!(
        out,
        "\n{} file(s): {} succeeded, {} failed, {} not started",
        batch.results.len() + batch.not_started.len(),
        batch.results.len() - batch.failed(),
        batch.failed(),
        batch.not_started.len(),
    );
    out
}

/// JSON document for a batch.
pub fn batch_json(batch: &BatchResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "batch_id": batch.batch_id,
        "success": batch.success(),
        "results": batch.results,
        "not_started": batch.not_started,
    }))
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(0).max(5)
}
