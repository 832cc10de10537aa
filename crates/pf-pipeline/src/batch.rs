//! Concurrent processing of many files under one policy.
//!
//! Each file is probed once, then handed to the [`PhaseRunner`]. Files run
//! concurrently up to `workers`; results come back in input order. When the
//! policy's default error mode is `stop` and a file fails, no further files
//! are started.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use pf_core::{BatchId, Error, FileProcessingResult, PhaseSummary, RunId};
use pf_probe::{MediaInfo, Prober};
use pf_rules::OnErrorMode;

use crate::context::{FileContext, ProgressSender};
use crate::runner::PhaseRunner;

/// Outcome of a batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub batch_id: BatchId,
    /// One result per processed file, in input order.
    pub results: Vec<FileProcessingResult>,
    /// Files never started because an earlier file halted the batch.
    pub not_started: Vec<PathBuf>,
}

impl BatchResult {
    /// Whether every processed file succeeded and every file was processed.
    pub fn success(&self) -> bool {
        self.not_started.is_empty() && self.results.iter().all(|r| r.success)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Drives a [`PhaseRunner`] over many files.
pub struct BatchRunner {
    runner: PhaseRunner,
    prober: Arc<dyn Prober>,
    workers: usize,
    dry_run: bool,
    progress: Arc<ProgressSender>,
}

impl BatchRunner {
    pub fn new(runner: PhaseRunner, prober: Arc<dyn Prober>) -> Self {
        Self {
            runner,
            prober,
            workers: 1,
            dry_run: false,
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Builder: number of files processed concurrently (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Builder: set dry-run mode on every file context.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: attach a progress sender shared by all files.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    /// Process every file, returning results in input order.
    pub async fn process_files(&self, paths: Vec<PathBuf>) -> BatchResult {
        let batch_id = BatchId::new();
        let halt_on_failure = self.runner.policy().default_on_error() == OnErrorMode::Stop;
        let halted = Arc::new(AtomicBool::new(false));

        tracing::info!(
            batch_id = %batch_id,
            files = paths.len(),
            workers = self.workers,
            "Starting batch"
        );

        let outcomes: Vec<(PathBuf, Option<FileProcessingResult>)> = stream::iter(paths)
            .map(|path| {
                let halted = halted.clone();
                async move {
                    if halted.load(Ordering::SeqCst) {
                        return (path, None);
                    }
                    let result = self.process_path(&path).await;
                    if halt_on_failure && !result.success {
                        tracing::warn!(
                            file = %path.display(),
                            "File failed under stop mode; not starting further files"
                        );
                        halted.store(true, Ordering::SeqCst);
                    }
                    (path, Some(result))
                }
            })
            .buffered(self.workers)
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut not_started = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Some(result) => results.push(result),
                None => not_started.push(path),
            }
        }

        tracing::info!(
            batch_id = %batch_id,
            processed = results.len(),
            not_started = not_started.len(),
            "Batch finished"
        );

        BatchResult {
            batch_id,
            results,
            not_started,
        }
    }

    async fn process_path(&self, path: &Path) -> FileProcessingResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        match self.probe(path.to_path_buf()).await {
            Ok(info) => {
                let ctx = FileContext::new(path, info)
                    .with_dry_run(self.dry_run)
                    .with_progress(self.progress.clone());
                self.runner.process_file(&ctx).await
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "Cannot probe file");
                FileProcessingResult {
                    run_id: RunId::new(),
                    file_path: path.to_path_buf(),
                    started_at,
                    duration_ms: clock.elapsed().as_millis() as u64,
                    success: false,
                    phase_results: Vec::new(),
                    summary: PhaseSummary::default(),
                    failed_phase: None,
                    error_message: Some(e.to_string()),
                    stopped_early: true,
                }
            }
        }
    }

    /// Probing is synchronous file I/O; keep it off the async workers.
    async fn probe(&self, path: PathBuf) -> pf_core::Result<MediaInfo> {
        let prober = self.prober.clone();
        tokio::task::spawn_blocking(move || prober.probe(&path))
            .await
            .map_err(|e| Error::Internal(format!("probe task failed: {e}")))?
    }
}
