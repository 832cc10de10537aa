//! Metadata snapshot types.
//!
//! Every attribute a skip predicate may read is optional: a snapshot produced
//! by a partial probe is still usable, and predicates over absent attributes
//! simply do not match.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Metadata for one media file, captured before its run begins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the probed file.
    #[serde(default)]
    pub file_path: PathBuf,
    /// File size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Container format name as reported by the prober (e.g. `matroska,webm`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// Total duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub video_tracks: Vec<VideoTrack>,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default)]
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

impl MediaInfo {
    /// An empty snapshot for `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Returns the primary video track.
    ///
    /// Prefers the first track marked as default; falls back to the first track.
    pub fn primary_video(&self) -> Option<&VideoTrack> {
        self.video_tracks
            .iter()
            .find(|t| t.default)
            .or_else(|| self.video_tracks.first())
    }

    /// Duration of the file, falling back to the primary video track.
    pub fn duration(&self) -> Option<f64> {
        self.duration_secs
            .or_else(|| self.primary_video().and_then(|v| v.duration_secs))
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn with_video(mut self, track: VideoTrack) -> Self {
        self.video_tracks.push(track);
        self
    }

    pub fn with_audio(mut self, track: AudioTrack) -> Self {
        self.audio_tracks.push(track);
        self
    }

    pub fn with_subtitle(mut self, track: SubtitleTrack) -> Self {
        self.subtitle_tracks.push(track);
        self
    }
}

/// A video track within a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoTrack {
    /// Codec name as reported by the prober (e.g. `hevc`, `h264`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Whether this is the default track.
    #[serde(default)]
    pub default: bool,
    /// Language code (ISO 639-2 or IETF).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl VideoTrack {
    pub fn new(codec: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            codec: Some(codec.into()),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

/// An audio track within a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl AudioTrack {
    pub fn new(codec: impl Into<String>) -> Self {
        Self {
            codec: Some(codec.into()),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A subtitle track within a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Subtitle codec/format identifier (e.g. "subrip", "ass", "hdmv_pgs_subtitle").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether this is a forced subtitle track.
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub default: bool,
}

impl SubtitleTrack {
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }
}
