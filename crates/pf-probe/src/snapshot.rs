//! A [`Prober`] that reads pre-probed JSON sidecar files.
//!
//! For `movie.mkv` the sidecar is `movie.mkv.probe.json` (the suffix is
//! configurable). The sidecar holds a serialized [`MediaInfo`]; missing
//! `file_path` and `file_size` are filled in from the media file itself.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use pf_core::Error;

use crate::prober::Prober;
use crate::types::MediaInfo;

/// Default sidecar suffix appended to the media file name.
pub const DEFAULT_SNAPSHOT_SUFFIX: &str = "probe.json";

/// Loads [`MediaInfo`] snapshots from `<file>.<suffix>` sidecars.
#[derive(Debug, Clone)]
pub struct SnapshotProber {
    suffix: String,
}

impl SnapshotProber {
    pub fn new(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        Self {
            suffix: suffix.trim_start_matches('.').to_string(),
        }
    }

    /// Sidecar path for a media file.
    pub fn snapshot_path(&self, path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".");
        name.push(&self.suffix);
        PathBuf::from(name)
    }
}

impl Default for SnapshotProber {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_SUFFIX)
    }
}

impl Prober for SnapshotProber {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn supports(&self, path: &Path) -> bool {
        self.snapshot_path(path).is_file()
    }

    fn probe(&self, path: &Path) -> pf_core::Result<MediaInfo> {
        let snapshot = self.snapshot_path(path);
        let raw = std::fs::read_to_string(&snapshot).map_err(|e| {
            Error::Probe(format!(
                "cannot read snapshot {}: {e}",
                snapshot.display()
            ))
        })?;
        let mut info: MediaInfo = serde_json::from_str(&raw).map_err(|e| {
            Error::Probe(format!("invalid snapshot {}: {e}", snapshot.display()))
        })?;

        if info.file_path.as_os_str().is_empty() {
            info.file_path = path.to_path_buf();
        }
        if info.file_size.is_none() {
            info.file_size = std::fs::metadata(path).ok().map(|m| m.len());
        }

        tracing::debug!(
            file = %path.display(),
            snapshot = %snapshot.display(),
            video_tracks = info.video_tracks.len(),
            audio_tracks = info.audio_tracks.len(),
            "Loaded metadata snapshot"
        );

        Ok(info)
    }
}
