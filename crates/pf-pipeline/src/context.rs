//! Per-file execution context shared by every phase of one run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pf_probe::MediaInfo;

/// Progress event sent before each phase is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseProgress {
    pub file: PathBuf,
    pub phase: String,
    /// Zero-based position of the phase among the phases being run.
    pub index: usize,
    pub total: usize,
}

impl PhaseProgress {
    /// Share of the file's phases already finished, 0.0 -- 100.0.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.index as f32 / self.total as f32) * 100.0
        }
    }
}

/// Sender for reporting phase progress to the caller.
pub struct ProgressSender {
    callback: Box<dyn Fn(&PhaseProgress) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(&PhaseProgress) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    pub fn send(&self, progress: &PhaseProgress) {
        (self.callback)(progress);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Context passed to the runner and on to every operation executor.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub file_path: PathBuf,
    /// Metadata snapshot taken before the run; never refreshed mid-run.
    pub media_info: Arc<MediaInfo>,
    /// When `true`, executors should log what they would do but skip actual work.
    pub dry_run: bool,
    pub progress: Arc<ProgressSender>,
}

impl FileContext {
    pub fn new(file_path: impl Into<PathBuf>, media_info: MediaInfo) -> Self {
        Self {
            file_path: file_path.into(),
            media_info: Arc::new(media_info),
            dry_run: false,
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Context for a snapshot, using the snapshot's own path.
    pub fn from_media_info(media_info: MediaInfo) -> Self {
        let path = media_info.file_path.clone();
        Self::new(path, media_info)
    }

    /// Builder: set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: Arc<ProgressSender>) -> Self {
        self.progress = progress;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn percent_of_phases_done() {
        let p = PhaseProgress {
            file: "/a.mkv".into(),
            phase: "b".into(),
            index: 1,
            total: 4,
        };
        assert_eq!(p.percent(), 25.0);
    }

    #[test]
    fn progress_callback_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sender = ProgressSender::new(move |p| sink.lock().unwrap().push(p.phase.clone()));
        sender.send(&PhaseProgress {
            file: "/a.mkv".into(),
            phase: "remux".into(),
            index: 0,
            total: 1,
        });
        assert_eq!(*seen.lock().unwrap(), vec!["remux".to_string()]);
    }

    #[test]
    fn context_from_snapshot_uses_its_path() {
        let ctx = FileContext::from_media_info(MediaInfo::new("/media/a.mkv")).with_dry_run(true);
        assert_eq!(ctx.path(), Path::new("/media/a.mkv"));
        assert!(ctx.dry_run);
    }
}
