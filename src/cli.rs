use clap::{Parser, Subcommand};
use pf_pipeline::ExecutorKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phaseforged")]
#[command(author, version, about = "Policy-driven phase execution for media files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a policy file
    Validate {
        /// Policy file (JSON or TOML)
        policy: PathBuf,
    },

    /// List the phases of a policy in execution order
    Phases {
        /// Policy file (JSON or TOML)
        policy: PathBuf,

        /// Output the validated policy as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a policy against media files
    Run {
        /// Policy file (JSON or TOML)
        policy: PathBuf,

        /// Media files to process; metadata is read from each file's snapshot sidecar
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only run these phases (comma-separated)
        #[arg(long, value_delimiter = ',')]
        phases: Option<Vec<String>>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Show what would be done without executing
        #[arg(long)]
        dry_run: bool,

        /// Number of files processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Executor performing phase operations (dry-run or command)
        #[arg(long)]
        executor: Option<ExecutorKind>,
    },
}
