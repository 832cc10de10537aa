//! Skip conditions evaluated against a [`MediaInfo`] snapshot.
//!
//! A policy writes `skip_when` as a flat table of optional fields:
//!
//! ```toml
//! skip_when = { video_codec = ["hevc", "av1"], file_size_under = "1GB" }
//! ```
//!
//! Each populated field becomes one [`SkipPredicate`]. With the default
//! [`SkipMode::Any`], the phase is skipped when any predicate matches; with
//! [`SkipMode::All`], only when every predicate matches.
//!
//! A predicate whose metadata is absent (no video track, unknown size, ...)
//! does not match. Evaluation is pure: it reads only the snapshot.

use std::fmt;

use pf_core::media::{container_matches, normalize_container, video_codec_matches};
use pf_core::{ByteSize, Resolution, SkipReason, Timespan, ValidationError};
use pf_probe::MediaInfo;
use serde::{Deserialize, Serialize};

/// One test over file metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipPredicate {
    /// Primary video codec is one of the listed codecs (alias-aware).
    VideoCodec(Vec<String>),
    /// Some audio track has this codec.
    AudioCodecExists(String),
    /// Some subtitle track has this language.
    SubtitleLanguageExists(String),
    /// Container is one of the listed formats.
    Container(Vec<String>),
    /// Primary video resolution label equals this one.
    Resolution(Resolution),
    /// Primary video height is strictly below this label's height.
    ResolutionUnder(Resolution),
    FileSizeUnder(ByteSize),
    FileSizeOver(ByteSize),
    DurationUnder(Timespan),
    DurationOver(Timespan),
}

/// Result of testing one predicate.
#[derive(Debug, Clone, PartialEq)]
enum Evaluation {
    Matched(SkipMatch),
    NoMatch,
    /// The metadata the predicate reads is absent.
    Unknown,
}

fn list(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

impl SkipPredicate {
    /// The policy field this predicate was written as.
    pub fn name(&self) -> &'static str {
        match self {
            Self::VideoCodec(_) => "video_codec",
            Self::AudioCodecExists(_) => "audio_codec_exists",
            Self::SubtitleLanguageExists(_) => "subtitle_language_exists",
            Self::Container(_) => "container",
            Self::Resolution(_) => "resolution",
            Self::ResolutionUnder(_) => "resolution_under",
            Self::FileSizeUnder(_) => "file_size_under",
            Self::FileSizeOver(_) => "file_size_over",
            Self::DurationUnder(_) => "duration_under",
            Self::DurationOver(_) => "duration_over",
        }
    }

    fn matched(&self, value: impl Into<String>, detail: impl Into<String>) -> Evaluation {
        Evaluation::Matched(SkipMatch {
            condition: self.name().to_string(),
            value: value.into(),
            detail: Some(detail.into()),
        })
    }

    fn evaluate(&self, info: &MediaInfo) -> Evaluation {
        match self {
            Self::VideoCodec(targets) => {
                let Some(codec) = info.primary_video().and_then(|v| v.codec.as_deref()) else {
                    return Evaluation::Unknown;
                };
                if targets.iter().any(|t| video_codec_matches(codec, t)) {
                    self.matched(codec, format!("in {}", list(targets)))
                } else {
                    Evaluation::NoMatch
                }
            }
            Self::AudioCodecExists(target) => {
                let mut codecs = info
                    .audio_tracks
                    .iter()
                    .filter_map(|t| t.codec.as_deref())
                    .peekable();
                if codecs.peek().is_none() {
                    return Evaluation::Unknown;
                }
                match codecs.find(|c| c.eq_ignore_ascii_case(target)) {
                    Some(codec) => self.matched(codec, "audio track present"),
                    None => Evaluation::NoMatch,
                }
            }
            Self::SubtitleLanguageExists(target) => {
                let mut languages = info
                    .subtitle_tracks
                    .iter()
                    .filter_map(|t| t.language.as_deref())
                    .peekable();
                if languages.peek().is_none() {
                    return Evaluation::Unknown;
                }
                match languages.find(|l| l.eq_ignore_ascii_case(target)) {
                    Some(language) => self.matched(language, "subtitle track present"),
                    None => Evaluation::NoMatch,
                }
            }
            Self::Container(targets) => {
                let Some(container) = info.container.as_deref() else {
                    return Evaluation::Unknown;
                };
                if targets.iter().any(|t| container_matches(container, t)) {
                    self.matched(normalize_container(container), format!("in {}", list(targets)))
                } else {
                    Evaluation::NoMatch
                }
            }
            Self::Resolution(target) => {
                let Some(height) = info.primary_video().and_then(|v| v.height) else {
                    return Evaluation::Unknown;
                };
                let actual = Resolution::from_height(height);
                if actual == *target {
                    self.matched(actual.to_string(), format!("equals {target}"))
                } else {
                    Evaluation::NoMatch
                }
            }
            Self::ResolutionUnder(target) => {
                let Some(height) = info.primary_video().and_then(|v| v.height) else {
                    return Evaluation::Unknown;
                };
                if height < target.height() {
                    let actual = Resolution::from_height(height);
                    self.matched(actual.to_string(), format!("under {target}"))
                } else {
                    Evaluation::NoMatch
                }
            }
            Self::FileSizeUnder(threshold) => match info.file_size {
                None => Evaluation::Unknown,
                Some(size) if size < threshold.bytes() => {
                    self.matched(format!("{size} bytes"), format!("under {threshold}"))
                }
                Some(_) => Evaluation::NoMatch,
            },
            Self::FileSizeOver(threshold) => match info.file_size {
                None => Evaluation::Unknown,
                Some(size) if size > threshold.bytes() => {
                    self.matched(format!("{size} bytes"), format!("over {threshold}"))
                }
                Some(_) => Evaluation::NoMatch,
            },
            Self::DurationUnder(threshold) => match info.duration() {
                None => Evaluation::Unknown,
                Some(secs) if secs < threshold.as_secs_f64() => {
                    self.matched(format!("{secs:.1}s"), format!("under {threshold}"))
                }
                Some(_) => Evaluation::NoMatch,
            },
            Self::DurationOver(threshold) => match info.duration() {
                None => Evaluation::Unknown,
                Some(secs) if secs > threshold.as_secs_f64() => {
                    self.matched(format!("{secs:.1}s"), format!("over {threshold}"))
                }
                Some(_) => Evaluation::NoMatch,
            },
        }
    }
}

/// How the predicates of a [`SkipCondition`] combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipMode {
    /// Skip when any predicate matches.
    #[default]
    Any,
    /// Skip only when every predicate matches.
    All,
}

impl fmt::Display for SkipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Which predicate caused a skip, and the metadata value that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipMatch {
    pub condition: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkipMatch {
    /// Convert into the reason recorded on a skipped phase.
    pub fn into_reason(self) -> SkipReason {
        SkipReason::Condition {
            condition: self.condition,
            value: self.value,
            detail: self.detail,
        }
    }

    /// Merge the matches of an `all`-mode condition into one.
    fn combine(matches: Vec<SkipMatch>) -> Self {
        let condition = matches
            .iter()
            .map(|m| m.condition.as_str())
            .collect::<Vec<_>>()
            .join(" and ");
        let value = matches
            .iter()
            .map(|m| m.value.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let details: Vec<_> = matches.iter().filter_map(|m| m.detail.as_deref()).collect();
        Self {
            condition,
            value,
            detail: (!details.is_empty()).then(|| details.join("; ")),
        }
    }
}

impl fmt::Display for SkipMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} matched '{}'", self.condition, self.value)
    }
}

/// A phase's `skip_when` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SkipConditionDef", into = "SkipConditionDef")]
pub struct SkipCondition {
    predicates: Vec<SkipPredicate>,
    mode: SkipMode,
}

impl SkipCondition {
    /// OR-combined condition, predicates tested in the given order.
    pub fn any(predicates: Vec<SkipPredicate>) -> Self {
        Self {
            predicates,
            mode: SkipMode::Any,
        }
    }

    /// AND-combined condition.
    pub fn all(predicates: Vec<SkipPredicate>) -> Self {
        Self {
            predicates,
            mode: SkipMode::All,
        }
    }

    pub fn predicates(&self) -> &[SkipPredicate] {
        &self.predicates
    }

    pub fn mode(&self) -> SkipMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Test the condition against a metadata snapshot.
    ///
    /// Returns the match that justifies skipping, or `None` if the phase
    /// should run.
    pub fn evaluate(&self, info: &MediaInfo) -> Option<SkipMatch> {
        let mut matches = Vec::new();
        let mut evaluated = 0usize;

        for predicate in &self.predicates {
            match predicate.evaluate(info) {
                Evaluation::Matched(m) => {
                    evaluated += 1;
                    if self.mode == SkipMode::Any {
                        return Some(m);
                    }
                    matches.push(m);
                }
                Evaluation::NoMatch => {
                    evaluated += 1;
                    if self.mode == SkipMode::All {
                        return None;
                    }
                }
                Evaluation::Unknown => {
                    tracing::debug!(
                        file = %info.file_path.display(),
                        condition = predicate.name(),
                        "Cannot evaluate skip predicate: metadata not available"
                    );
                    if self.mode == SkipMode::All {
                        return None;
                    }
                }
            }
        }

        if evaluated == 0 && !self.predicates.is_empty() {
            tracing::warn!(
                file = %info.file_path.display(),
                predicates = self.predicates.len(),
                "No skip_when predicate could be evaluated; phase will run"
            );
        }

        if self.mode == SkipMode::All && !matches.is_empty() {
            return Some(SkipMatch::combine(matches));
        }
        None
    }

    /// Short human summary, e.g. `video_codec in [hevc] or file_size_under 1GB`.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .predicates
            .iter()
            .map(|p| match p {
                SkipPredicate::VideoCodec(v) | SkipPredicate::Container(v) => {
                    format!("{} in {}", p.name(), list(v))
                }
                SkipPredicate::AudioCodecExists(s) | SkipPredicate::SubtitleLanguageExists(s) => {
                    format!("{} {s}", p.name())
                }
                SkipPredicate::Resolution(r) | SkipPredicate::ResolutionUnder(r) => {
                    format!("{} {r}", p.name())
                }
                SkipPredicate::FileSizeUnder(b) | SkipPredicate::FileSizeOver(b) => {
                    format!("{} {b}", p.name())
                }
                SkipPredicate::DurationUnder(d) | SkipPredicate::DurationOver(d) => {
                    format!("{} {d}", p.name())
                }
            })
            .collect();
        let joiner = match self.mode {
            SkipMode::Any => " or ",
            SkipMode::All => " and ",
        };
        parts.join(joiner)
    }
}

// ---------------------------------------------------------------------------
// Document form
// ---------------------------------------------------------------------------

/// The flat, optional-field shape `skip_when` takes in a policy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SkipConditionDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video_codec: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_codec_exists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtitle_language_exists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    container: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolution_under: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_size_under: Option<ByteSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_size_over: Option<ByteSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_under: Option<Timespan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_over: Option<Timespan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<SkipMode>,
}

fn non_empty_list(field: &'static str, values: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(ValidationError::invalid_threshold(
            field,
            "[]",
            "list must name at least one value",
        ));
    }
    Ok(values)
}

fn non_empty_string(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::invalid_threshold(field, value, "value must not be empty"));
    }
    Ok(trimmed.to_string())
}

impl TryFrom<SkipConditionDef> for SkipCondition {
    type Error = ValidationError;

    /// Predicates are ordered canonically, independent of document key order.
    fn try_from(def: SkipConditionDef) -> Result<Self, Self::Error> {
        let mut predicates = Vec::new();
        if let Some(v) = def.video_codec {
            predicates.push(SkipPredicate::VideoCodec(non_empty_list("video_codec", v)?));
        }
        if let Some(v) = def.audio_codec_exists {
            predicates.push(SkipPredicate::AudioCodecExists(non_empty_string(
                "audio_codec_exists",
                v,
            )?));
        }
        if let Some(v) = def.subtitle_language_exists {
            predicates.push(SkipPredicate::SubtitleLanguageExists(non_empty_string(
                "subtitle_language_exists",
                v,
            )?));
        }
        if let Some(v) = def.container {
            predicates.push(SkipPredicate::Container(non_empty_list("container", v)?));
        }
        predicates.extend(def.resolution.map(SkipPredicate::Resolution));
        predicates.extend(def.resolution_under.map(SkipPredicate::ResolutionUnder));
        predicates.extend(def.file_size_under.map(SkipPredicate::FileSizeUnder));
        predicates.extend(def.file_size_over.map(SkipPredicate::FileSizeOver));
        predicates.extend(def.duration_under.map(SkipPredicate::DurationUnder));
        predicates.extend(def.duration_over.map(SkipPredicate::DurationOver));

        Ok(Self {
            predicates,
            mode: def.mode.unwrap_or_default(),
        })
    }
}

impl From<SkipCondition> for SkipConditionDef {
    fn from(condition: SkipCondition) -> Self {
        let mut def = SkipConditionDef {
            mode: (condition.mode != SkipMode::Any).then_some(condition.mode),
            ..Default::default()
        };
        for predicate in condition.predicates {
            match predicate {
                SkipPredicate::VideoCodec(v) => def.video_codec = Some(v),
                SkipPredicate::AudioCodecExists(v) => def.audio_codec_exists = Some(v),
                SkipPredicate::SubtitleLanguageExists(v) => def.subtitle_language_exists = Some(v),
                SkipPredicate::Container(v) => def.container = Some(v),
                SkipPredicate::Resolution(v) => def.resolution = Some(v),
                SkipPredicate::ResolutionUnder(v) => def.resolution_under = Some(v),
                SkipPredicate::FileSizeUnder(v) => def.file_size_under = Some(v),
                SkipPredicate::FileSizeOver(v) => def.file_size_over = Some(v),
                SkipPredicate::DurationUnder(v) => def.duration_under = Some(v),
                SkipPredicate::DurationOver(v) => def.duration_over = Some(v),
            }
        }
        def
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_probe::{AudioTrack, SubtitleTrack, VideoTrack};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn hevc_4k() -> MediaInfo {
        let mut video = VideoTrack::new("hevc", 3840, 2160);
        video.duration_secs = Some(5400.0);
        MediaInfo::new("/media/movie.mkv")
            .with_container("matroska,webm")
            .with_file_size(8 * GIB)
            .with_video(video)
            .with_audio(AudioTrack::new("truehd").with_language("eng"))
            .with_subtitle(SubtitleTrack::with_language("eng"))
    }

    fn parse(json: &str) -> SkipCondition {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn video_codec_alias_matches() {
        let cond = parse(r#"{"video_codec": ["h265"]}"#);
        let m = cond.evaluate(&hevc_4k()).unwrap();
        assert_eq!(m.condition, "video_codec");
        assert_eq!(m.value, "hevc");
        assert_eq!(
            m.into_reason().message(),
            "condition 'video_codec' matched 'hevc' (in [h265])"
        );
    }

    #[test]
    fn or_semantics_reports_the_matching_predicate() {
        let cond = parse(r#"{"video_codec": ["h264"], "container": ["mkv"]}"#);
        let m = cond.evaluate(&hevc_4k()).unwrap();
        assert_eq!(m.condition, "container");
        assert_eq!(m.value, "mkv");
    }

    #[test]
    fn canonical_order_wins_over_document_order() {
        let cond = parse(r#"{"container": ["mkv"], "video_codec": ["hevc"]}"#);
        assert_eq!(cond.evaluate(&hevc_4k()).unwrap().condition, "video_codec");
    }

    #[test]
    fn nothing_matches() {
        let cond = parse(r#"{"video_codec": ["av1"], "file_size_under": "1GB"}"#);
        assert!(cond.evaluate(&hevc_4k()).is_none());
    }

    #[test]
    fn track_existence_predicates() {
        let audio = parse(r#"{"audio_codec_exists": "TRUEHD"}"#);
        assert_eq!(audio.evaluate(&hevc_4k()).unwrap().value, "truehd");

        let subs = parse(r#"{"subtitle_language_exists": "fre"}"#);
        assert!(subs.evaluate(&hevc_4k()).is_none());
    }

    #[test]
    fn resolution_predicates() {
        let exact = parse(r#"{"resolution": "4k"}"#);
        assert_eq!(exact.evaluate(&hevc_4k()).unwrap().value, "2160p");

        let under = parse(r#"{"resolution_under": "2160p"}"#);
        assert!(under.evaluate(&hevc_4k()).is_none());

        let info = MediaInfo::new("/a.mkv").with_video(VideoTrack::new("h264", 1280, 720));
        let m = under.evaluate(&info).unwrap();
        assert_eq!(m.value, "720p");
        assert_eq!(m.detail.as_deref(), Some("under 2160p"));
    }

    #[test]
    fn thresholds_are_strict() {
        let info = MediaInfo::new("/a.mkv").with_file_size(GIB).with_duration_secs(1800.0);
        assert!(parse(r#"{"file_size_under": "1GB"}"#).evaluate(&info).is_none());
        assert!(parse(r#"{"file_size_over": "1GB"}"#).evaluate(&info).is_none());
        assert!(parse(r#"{"duration_under": "30m"}"#).evaluate(&info).is_none());
        assert!(parse(r#"{"duration_over": "30m"}"#).evaluate(&info).is_none());

        let m = parse(r#"{"file_size_over": "512MB"}"#).evaluate(&info).unwrap();
        assert_eq!(m.value, format!("{GIB} bytes"));
        let m = parse(r#"{"duration_under": "1h"}"#).evaluate(&info).unwrap();
        assert_eq!(m.value, "1800.0s");
    }

    #[test]
    fn duration_falls_back_to_video_track() {
        let m = parse(r#"{"duration_over": "1h"}"#).evaluate(&hevc_4k()).unwrap();
        assert_eq!(m.value, "5400.0s");
    }

    #[test]
    fn missing_metadata_is_non_matching() {
        let bare = MediaInfo::new("/a.mkv");
        let cond = parse(
            r#"{"video_codec": ["hevc"], "container": ["mkv"], "file_size_under": "1GB", "duration_over": "1m"}"#,
        );
        assert!(cond.evaluate(&bare).is_none());

        // An unknown predicate does not stop later ones from matching.
        let sized = MediaInfo::new("/a.mkv").with_file_size(10);
        assert_eq!(cond.evaluate(&sized).unwrap().condition, "file_size_under");
    }

    #[test]
    fn all_mode_requires_every_predicate() {
        let cond = parse(r#"{"video_codec": ["hevc"], "container": ["mp4"], "mode": "all"}"#);
        assert_eq!(cond.mode(), SkipMode::All);
        assert!(cond.evaluate(&hevc_4k()).is_none());

        let cond = parse(r#"{"video_codec": ["hevc"], "container": ["mkv"], "mode": "all"}"#);
        let m = cond.evaluate(&hevc_4k()).unwrap();
        assert_eq!(m.condition, "video_codec and container");
        assert_eq!(m.value, "hevc, mkv");
    }

    #[test]
    fn all_mode_with_unknown_predicate_does_not_match() {
        let cond = parse(r#"{"video_codec": ["hevc"], "file_size_under": "100GB", "mode": "all"}"#);
        let info = MediaInfo::new("/a.mkv").with_video(VideoTrack::new("hevc", 1920, 1080));
        assert!(cond.evaluate(&info).is_none());
    }

    #[test]
    fn empty_block_parses_as_empty_condition() {
        assert!(parse("{}").is_empty());
    }

    #[test]
    fn invalid_fields_are_rejected() {
        assert!(serde_json::from_str::<SkipCondition>(r#"{"video_codec": []}"#).is_err());
        assert!(serde_json::from_str::<SkipCondition>(r#"{"file_size_under": "big"}"#).is_err());
        assert!(serde_json::from_str::<SkipCondition>(r#"{"resolution": "1080i"}"#).is_err());
        assert!(serde_json::from_str::<SkipCondition>(r#"{"codec": ["hevc"]}"#).is_err());
    }

    #[test]
    fn describe_lists_predicates() {
        let cond = parse(r#"{"video_codec": ["hevc", "av1"], "file_size_under": "1GB"}"#);
        assert_eq!(cond.describe(), "video_codec in [hevc, av1] or file_size_under 1GB");
    }

    #[test]
    fn programmatic_order_is_kept() {
        let cond = SkipCondition::any(vec![
            SkipPredicate::FileSizeOver(ByteSize::from_bytes(1)),
            SkipPredicate::VideoCodec(vec!["hevc".into()]),
        ]);
        assert_eq!(cond.evaluate(&hevc_4k()).unwrap().condition, "file_size_over");
    }
}
