//! Threshold literals used by skip conditions.
//!
//! Policies write sizes as `5GB` / `500 MB` and durations as `30m`, `2h` or
//! `1h30m`. Both are parsed once, when the policy is loaded, so evaluation
//! never has to deal with malformed input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ValidationError;

const SIZE_UNITS: &[(&str, u64)] = &[
    ("TB", 1024 * 1024 * 1024 * 1024),
    ("GB", 1024 * 1024 * 1024),
    ("MB", 1024 * 1024),
    ("KB", 1024),
    ("B", 1),
];

/// Split `"1.5 GB"` into `("1.5", "GB")`.
fn split_number(s: &str) -> (&str, &str) {
    let idx = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    (s[..idx].trim(), s[idx..].trim())
}

fn too_large(kind: &'static str, raw: &str) -> ValidationError {
    ValidationError::invalid_threshold(kind, raw, "value too large")
}

fn parse_amount(kind: &'static str, raw: &str, number: &str) -> Result<f64, ValidationError> {
    let value: f64 = number
        .parse()
        .map_err(|_| ValidationError::invalid_threshold(kind, raw, "missing numeric value"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::invalid_threshold(
            kind,
            raw,
            "value must be a non-negative number",
        ));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// ByteSize
// ---------------------------------------------------------------------------

/// A file size threshold in bytes, written with binary units (`1KB` = 1024).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteSize(u64);

impl ByteSize {
    /// Construct from a raw byte count.
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// The threshold in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    /// Formats with the largest unit that divides the value exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, multiplier) in SIZE_UNITS {
            if self.0 != 0 && self.0 % multiplier == 0 {
                return write!(f, "{}{unit}", self.0 / multiplier);
            }
        }
        write!(f, "{}B", self.0)
    }
}

impl FromStr for ByteSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, unit) = split_number(s.trim());
        let unit = unit.to_uppercase();
        let multiplier = SIZE_UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, m)| *m)
            .ok_or_else(|| {
                ValidationError::invalid_threshold("file size", s, "unit must be B, KB, MB, GB or TB")
            })?;
        let amount = parse_amount("file size", s, number)?;
        let bytes = amount * multiplier as f64;
        // `as` would saturate at u64::MAX.
        if bytes >= u64::MAX as f64 {
            return Err(too_large("file size", s));
        }
        Ok(Self(bytes as u64))
    }
}

impl TryFrom<String> for ByteSize {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ByteSize> for String {
    fn from(value: ByteSize) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Timespan
// ---------------------------------------------------------------------------

/// A duration threshold written as `90s`, `30m`, `2h` or `1h30m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timespan(Duration);

impl Timespan {
    /// Construct from a [`Duration`].
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Construct from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// The threshold as a [`Duration`].
    pub const fn duration(self) -> Duration {
        self.0
    }

    /// The threshold in (fractional) seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if self.0.subsec_nanos() != 0 || secs == 0 {
            return write!(f, "{}s", self.0.as_secs_f64());
        }
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        match (hours, minutes, seconds) {
            (0, 0, s) => write!(f, "{s}s"),
            (0, m, 0) => write!(f, "{m}m"),
            (h, 0, 0) => write!(f, "{h}h"),
            (h, m, 0) => write!(f, "{h}h{m}m"),
            _ => write!(f, "{secs}s"),
        }
    }
}

impl FromStr for Timespan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();

        // Compound form: 1h30m
        if let Some((hours, rest)) = lower.split_once('h') {
            if let Some(minutes) = rest.strip_suffix('m') {
                let hours: u64 = hours.trim().parse().map_err(|_| {
                    ValidationError::invalid_threshold("duration", s, "expected whole hours before 'h'")
                })?;
                let minutes: u64 = minutes.trim().parse().map_err(|_| {
                    ValidationError::invalid_threshold("duration", s, "expected whole minutes before 'm'")
                })?;
                let secs = hours
                    .checked_mul(3600)
                    .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
                    .ok_or_else(|| too_large("duration", s))?;
                return Ok(Self::from_secs(secs));
            }
        }

        let (number, unit) = split_number(&lower);
        let multiplier = match unit {
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => {
                return Err(ValidationError::invalid_threshold(
                    "duration",
                    s,
                    "expected a number followed by s, m or h (or the form 1h30m)",
                ))
            }
        };
        let amount = parse_amount("duration", s, number)?;
        Duration::try_from_secs_f64(amount * multiplier)
            .map(Self)
            .map_err(|_| too_large("duration", s))
    }
}

impl TryFrom<String> for Timespan {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timespan> for String {
    fn from(value: Timespan) -> Self {
        value.to_string()
    }
}
