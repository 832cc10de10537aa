//! Media-domain matching helpers: codec aliases, container names, and
//! resolution labels.
//!
//! Probers report codec and container names the way the underlying tool
//! spells them (`hevc`, `hvc1`, `matroska,webm`, ...). Policies are written by
//! people who say `h265` and `mkv`. Everything here maps both sides onto a
//! common vocabulary before comparing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

/// Groups of video codec spellings that denote the same codec.
const VIDEO_CODEC_ALIASES: &[&[&str]] = &[
    &["hevc", "h265", "h.265", "x265", "hvc1", "hev1"],
    &["h264", "h.264", "avc", "avc1", "x264"],
    &["vp9", "vp09"],
    &["av1", "av01", "libaom-av1"],
    &["mpeg4", "mp4v"],
];

fn alias_group(codec: &str) -> Option<usize> {
    VIDEO_CODEC_ALIASES
        .iter()
        .position(|group| group.contains(&codec))
}

/// Whether a probed video codec matches a codec named in a policy.
///
/// Comparison is case-insensitive and alias-aware, so `hvc1` matches `h265`.
pub fn video_codec_matches(current: &str, target: &str) -> bool {
    let current = current.trim().to_lowercase();
    let target = target.trim().to_lowercase();

    if current == target {
        return true;
    }

    match (alias_group(&current), alias_group(&target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Normalize a container format name to its short form.
///
/// Handles probe output such as `matroska,webm` and
/// `mov,mp4,m4a,3gp,3g2,mj2` as well as plain extensions.
pub fn normalize_container(container: &str) -> String {
    let container = container.trim().to_lowercase();

    match container.as_str() {
        "matroska" | "matroska,webm" | "webm" => return "mkv".into(),
        "mov,mp4,m4a,3gp,3g2,mj2" => return "mp4".into(),
        "quicktime" => return "mov".into(),
        _ => {}
    }

    if container.contains("matroska") {
        "mkv".into()
    } else if ["mp4", "m4a", "m4v"].iter().any(|x| container.contains(x)) {
        "mp4".into()
    } else if container.contains("mov") || container.contains("quicktime") {
        "mov".into()
    } else if container.contains("avi") {
        "avi".into()
    } else {
        container
    }
}

/// Whether two container names refer to the same format.
pub fn container_matches(current: &str, target: &str) -> bool {
    normalize_container(current) == normalize_container(target)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Standard resolution labels, keyed by frame height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    P480,
    P720,
    P1080,
    P1440,
    P2160,
    P4320,
}

impl Resolution {
    /// Nominal frame height in pixels.
    pub fn height(self) -> u32 {
        match self {
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
            Self::P1440 => 1440,
            Self::P2160 => 2160,
            Self::P4320 => 4320,
        }
    }

    /// Classify a frame height into the largest label it reaches.
    ///
    /// Anything below 720 lines is reported as `480p`.
    pub fn from_height(height: u32) -> Self {
        match height {
            h if h >= 4320 => Self::P4320,
            h if h >= 2160 => Self::P2160,
            h if h >= 1440 => Self::P1440,
            h if h >= 1080 => Self::P1080,
            h if h >= 720 => Self::P720,
            _ => Self::P480,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

impl FromStr for Resolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "480p" => Ok(Self::P480),
            "720p" => Ok(Self::P720),
            "1080p" => Ok(Self::P1080),
            "1440p" => Ok(Self::P1440),
            "2160p" | "4k" => Ok(Self::P2160),
            "4320p" | "8k" => Ok(Self::P4320),
            _ => Err(ValidationError::invalid_threshold(
                "resolution",
                s,
                "expected one of 480p, 720p, 1080p, 1440p, 2160p, 4k, 8k",
            )),
        }
    }
}

impl TryFrom<String> for Resolution {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_direct_match_is_case_insensitive() {
        assert!(video_codec_matches("HEVC", "hevc"));
        assert!(video_codec_matches("vp9", "VP9"));
    }

    #[test]
    fn codec_aliases_match_both_ways() {
        assert!(video_codec_matches("hevc", "h265"));
        assert!(video_codec_matches("hvc1", "hevc"));
        assert!(video_codec_matches("h264", "avc"));
        assert!(video_codec_matches("av01", "av1"));
    }

    #[test]
    fn codec_groups_do_not_cross() {
        assert!(!video_codec_matches("h264", "hevc"));
        assert!(!video_codec_matches("vp9", "av1"));
        assert!(!video_codec_matches("prores", "h264"));
    }

    #[test]
    fn container_normalization() {
        assert_eq!(normalize_container("matroska,webm"), "mkv");
        assert_eq!(normalize_container("Matroska"), "mkv");
        assert_eq!(normalize_container("mov,mp4,m4a,3gp,3g2,mj2"), "mp4");
        assert_eq!(normalize_container("m4v"), "mp4");
        assert_eq!(normalize_container("quicktime"), "mov");
        assert_eq!(normalize_container("avi"), "avi");
        assert_eq!(normalize_container("mpegts"), "mpegts");
    }

    #[test]
    fn container_matches_across_spellings() {
        assert!(container_matches("matroska,webm", "mkv"));
        assert!(!container_matches("matroska,webm", "mp4"));
    }

    #[test]
    fn resolution_labels_from_height() {
        assert_eq!(Resolution::from_height(2160), Resolution::P2160);
        assert_eq!(Resolution::from_height(1600), Resolution::P1440);
        assert_eq!(Resolution::from_height(1080), Resolution::P1080);
        assert_eq!(Resolution::from_height(800), Resolution::P720);
        assert_eq!(Resolution::from_height(576), Resolution::P480);
    }

    #[test]
    fn resolution_parse_accepts_k_aliases() {
        assert_eq!("4k".parse::<Resolution>().unwrap(), Resolution::P2160);
        assert_eq!("8K".parse::<Resolution>().unwrap(), Resolution::P4320);
        assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::P1080);
        assert!("1080i".parse::<Resolution>().is_err());
    }

    #[test]
    fn resolution_serde_uses_label() {
        let json = serde_json::to_string(&Resolution::P720).unwrap();
        assert_eq!(json, "\"720p\"");
        let back: Resolution = serde_json::from_str("\"4k\"").unwrap();
        assert_eq!(back, Resolution::P2160);
    }
}
