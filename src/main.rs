mod cli;

use phaseforged::{config, render};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use pf_pipeline::{BatchRunner, ExecutorKind, PhaseRunner, ProgressSender, ValidatedPolicy};
use pf_probe::SnapshotProber;
use pf_rules::Policy;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "phaseforged=trace,pf_pipeline=trace,pf_rules=debug,pf_probe=debug,pf_core=debug"
                .to_string()
        } else {
            "phaseforged=info,pf_pipeline=info,pf_rules=info,pf_probe=info".to_string()
        }
    });

    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Policy problems exit with 2, everything else with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<pf_core::Error>() {
        Some(e) if e.exit_code() == 2 => 2,
        _ => 1,
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Validate { policy } => validate_policy(&policy, config_path),
        Commands::Phases { policy, json } => list_phases(&policy, config_path, json),
        Commands::Run {
            policy,
            files,
            phases,
            json,
            dry_run,
            workers,
            executor,
        } => run_policy(
            &policy,
            files,
            RunOptions {
                phases,
                json,
                dry_run,
                workers,
                executor,
            },
            config_path,
        ),
    }
}

struct RunOptions {
    phases: Option<Vec<String>>,
    json: bool,
    dry_run: bool,
    workers: Option<usize>,
    executor: Option<ExecutorKind>,
}

/// Parse a policy document and validate it under the configured default
/// error mode.
fn load_policy(path: &Path, config: &config::Config) -> Result<(Policy, ValidatedPolicy)> {
    let policy =
        Policy::load(path).with_context(|| format!("Failed to load policy: {:?}", path))?;
    let validated = ValidatedPolicy::from_policy(policy.clone(), config.engine.default_on_error)
        .map_err(pf_core::Error::from)
        .with_context(|| format!("Invalid policy: {:?}", path))?;
    Ok((policy, validated))
}

fn validate_policy(path: &Path, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = config::load_config_or_default(config_path)?;
    println!("Validating policy: {:?}", path);
    let (_, policy) = load_policy(path, &config)?;

    println!("✓ Policy is valid");
    println!("  Phases: {}", policy.phases().len());
    println!("  Default on_error: {}", policy.default_on_error());
    println!(
        "  With dependencies: {}",
        policy.phases().iter().filter(|p| !p.depends_on.is_empty()).count()
    );
    Ok(ExitCode::SUCCESS)
}

fn list_phases(path: &Path, config_path: Option<&Path>, json: bool) -> Result<ExitCode> {
    let config = config::load_config_or_default(config_path)?;
    let (document, policy) = load_policy(path, &config)?;

    if json {
        println!("{}", pf_rules::policy_to_json(&document)?);
    } else {
        print!("{}", render::phases_table(&policy));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_policy(
    path: &Path,
    files: Vec<PathBuf>,
    opts: RunOptions,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let config = config::load_config_or_default(config_path)?;
    let (_, policy) = load_policy(path, &config)?;

    let kind = opts.executor.unwrap_or(config.executor.kind);
    let executor = kind.build(Duration::from_secs(config.executor.timeout_secs));

    let mut runner = PhaseRunner::new(Arc::new(policy), executor);
    if let Some(names) = &opts.phases {
        let (selected, warnings) = runner.with_selected_phases(names.as_slice())?;
        for warning in &warnings {
            eprintln!("warning: {warning}");
        }
        runner = selected;
    }

    let workers = opts.workers.unwrap_or(config.engine.workers);
    tracing::info!(
        policy = %path.display(),
        files = files.len(),
        workers,
        executor = %kind,
        dry_run = opts.dry_run,
        "Running policy"
    );

    let prober = SnapshotProber::new(config.probe.snapshot_suffix.as_str());
    let batch = BatchRunner::new(runner, Arc::new(prober))
        .with_workers(workers)
        .with_dry_run(opts.dry_run)
        .with_progress(ProgressSender::new(|p| {
            tracing::debug!(
                file = %p.file.display(),
                phase = %p.phase,
                percent = p.percent(),
                "Phase progress"
            );
        }));

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(batch.process_files(files));

    if opts.json {
        println!("{}", render::batch_json(&result)?);
    } else {
        print!("{}", render::batch_report(&result));
    }

    Ok(if result.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
