//! Policy documents: the ordered phase list plus policy-wide settings.
//!
//! JSON shape (TOML is equivalent):
//!
//! ```json
//! {
//!   "config": { "on_error": "stop" },
//!   "phases": [
//!     { "name": "normalize", "operations": { "remux": { "container": "mkv" } } },
//!     { "name": "transcode", "skip_when": { "video_codec": ["hevc"] } },
//!     { "name": "verify", "depends_on": ["transcode"] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use pf_core::{Error, ValidationError};
use serde::{Deserialize, Serialize};

use crate::phase::{OnErrorMode, PhaseDefinition};

/// Keys of the policy document itself; no phase may be named after them.
pub const RESERVED_PHASE_NAMES: &[&str] = &["config", "schema_version", "phases"];

const MAX_PHASE_NAME_LEN: usize = 64;

/// Policy-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Default error mode for phases without their own `on_error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<OnErrorMode>,
}

/// A parsed policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub config: PolicyConfig,
    pub phases: Vec<PhaseDefinition>,
}

impl Policy {
    pub fn new(phases: Vec<PhaseDefinition>) -> Self {
        Self {
            schema_version: None,
            config: PolicyConfig::default(),
            phases,
        }
    }

    pub fn with_on_error(mut self, mode: OnErrorMode) -> Self {
        self.config.on_error = Some(mode);
        self
    }

    /// Parse and validate a JSON policy.
    pub fn from_json(s: &str) -> pf_core::Result<Self> {
        let policy: Policy =
            serde_json::from_str(s).map_err(|e| Error::policy(format!("invalid JSON policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parse and validate a TOML policy.
    pub fn from_toml(s: &str) -> pf_core::Result<Self> {
        let policy: Policy =
            toml::from_str(s).map_err(|e| Error::policy(format!("invalid TOML policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy file; `.toml` files are read as TOML, everything else as JSON.
    pub fn load(path: &Path) -> pf_core::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let policy = if is_toml {
            Self::from_toml(&raw)?
        } else {
            Self::from_json(&raw)?
        };

        tracing::debug!(
            path = %path.display(),
            phases = policy.phases.len(),
            "Loaded policy"
        );
        Ok(policy)
    }

    /// Phase names in declared order.
    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }

    /// Document-level checks: phase naming rules and non-empty conditions.
    ///
    /// Graph-level checks (unknown dependencies, cycles, `run_if`
    /// ordering) happen when the policy is turned into a validated policy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phases.is_empty() {
            return Err(ValidationError::EmptyPolicy);
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for phase in &self.phases {
            validate_phase_name(&phase.name)?;
            if let Some(existing) = seen.insert(phase.name.to_lowercase(), &phase.name) {
                return Err(ValidationError::DuplicatePhase {
                    name: phase.name.clone(),
                    existing: existing.to_string(),
                });
            }
        }

        check_skip_conditions(&self.phases)
    }
}

/// Check a phase name against the naming rules.
///
/// A name starts with an ASCII letter, continues with letters, digits, `-`
/// or `_`, is at most 64 characters long and is not a reserved document key.
pub fn validate_phase_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && name.len() <= MAX_PHASE_NAME_LEN;
    if !valid {
        return Err(ValidationError::InvalidPhaseName {
            name: name.to_string(),
        });
    }
    if RESERVED_PHASE_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(name))
    {
        return Err(ValidationError::ReservedPhaseName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Reject `skip_when` blocks that name no predicate.
pub fn check_skip_conditions(phases: &[PhaseDefinition]) -> Result<(), ValidationError> {
    match phases
        .iter()
        .find(|p| p.skip_when.as_ref().is_some_and(|c| c.is_empty()))
    {
        Some(phase) => Err(ValidationError::EmptySkipCondition {
            phase: phase.name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn json_policy() {
        let policy = Policy::from_json(
            r#"{
                "config": {"on_error": "fail"},
                "phases": [
                    {"name": "normalize", "operations": {"remux": {"container": "mkv"}}},
                    {"name": "transcode", "skip_when": {"video_codec": ["hevc"]}},
                    {"name": "verify", "depends_on": ["transcode"], "run_if": {"phase_modified": "transcode"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(policy.config.on_error, Some(OnErrorMode::Stop));
        assert_eq!(policy.phase_names(), vec!["normalize", "transcode", "verify"]);
        assert!(policy.phases[1].skip_when.is_some());
        assert_eq!(policy.phases[0].operations.keys(), vec!["remux"]);
    }

    #[test]
    fn toml_policy_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[config]
on_error = "skip"

[[phases]]
name = "transcode"
on_error = "continue"
skip_when = {{ file_size_under = "500MB", mode = "any" }}

[phases.operations.transcode]
video = "hevc"

[[phases]]
name = "tag"
depends_on = ["transcode"]
"#
        )
        .unwrap();

        let policy = Policy::load(file.path()).unwrap();
        assert_eq!(policy.config.on_error, Some(OnErrorMode::Skip));
        assert_eq!(policy.phases[0].on_error, Some(OnErrorMode::Continue));
        assert_eq!(policy.phases[0].operations.keys(), vec!["transcode"]);
        assert_eq!(policy.phases[1].depends_on, vec!["transcode"]);
    }

    #[test]
    fn empty_policy_rejected() {
        let err = Policy::from_json(r#"{"phases": []}"#).unwrap_err();
        assert_matches!(err, Error::Validation(ValidationError::EmptyPolicy));
    }

    #[test]
    fn duplicate_names_case_insensitive() {
        let policy = Policy::new(vec![PhaseDefinition::new("Remux"), PhaseDefinition::new("remux")]);
        assert_matches!(
            policy.validate(),
            Err(ValidationError::DuplicatePhase { name, existing }) if name == "remux" && existing == "Remux"
        );
    }

    #[test]
    fn phase_name_rules() {
        assert!(validate_phase_name("transcode-hevc_2").is_ok());
        assert_matches!(
            validate_phase_name("2pass"),
            Err(ValidationError::InvalidPhaseName { .. })
        );
        assert_matches!(
            validate_phase_name("has space"),
            Err(ValidationError::InvalidPhaseName { .. })
        );
        assert_matches!(validate_phase_name(""), Err(ValidationError::InvalidPhaseName { .. }));
        assert!(validate_phase_name(&"a".repeat(64)).is_ok());
        assert!(validate_phase_name(&"a".repeat(65)).is_err());
        assert_matches!(
            validate_phase_name("Config"),
            Err(ValidationError::ReservedPhaseName { .. })
        );
    }

    #[test]
    fn empty_skip_when_rejected() {
        let err = Policy::from_json(r#"{"phases": [{"name": "a", "skip_when": {}}]}"#).unwrap_err();
        assert_matches!(
            err,
            Error::Validation(ValidationError::EmptySkipCondition { phase }) if phase == "a"
        );
    }

    #[test]
    fn bad_threshold_is_policy_error() {
        let err = Policy::from_json(
            r#"{"phases": [{"name": "a", "skip_when": {"duration_over": "forever"}}]}"#,
        )
        .unwrap_err();
        assert_matches!(err, Error::Policy(_));
        assert!(err.to_string().contains("invalid duration 'forever'"), "got: {err}");
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        assert!(Policy::from_json(r#"{"phases": [{"name": "a"}], "extra": 1}"#).is_err());
    }

    #[test]
    fn misspelled_phase_keys_rejected() {
        let err = Policy::from_json(r#"{"phases": [{"name": "a"}, {"name": "b", "depend_on": ["a"]}]}"#)
            .unwrap_err();
        assert_matches!(err, Error::Policy(_));
        assert!(err.to_string().contains("depend_on"), "got: {err}");

        let err = Policy::from_json(
            r#"{"phases": [{"name": "a", "skip_whne": {"container": ["mkv"]}}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("skip_whne"), "got: {err}");
    }

    #[test]
    fn operations_live_under_their_own_key() {
        assert!(Policy::from_json(r#"{"phases": [{"name": "a", "remux": {}}]}"#).is_err());

        let policy = Policy::from_json(r#"{"phases": [{"name": "a"}]}"#).unwrap();
        assert!(policy.phases[0].operations.is_empty());
        let json = crate::policy_to_json(&policy).unwrap();
        assert!(!json.contains("operations"), "got: {json}");
    }

    #[test]
    fn serializes_back_to_document() {
        let policy = Policy::from_json(
            r#"{"phases": [{"name": "a", "skip_when": {"container": ["mkv"]}, "operations": {"remux": {}}}]}"#,
        )
        .unwrap();
        let json = crate::policy_to_json(&policy).unwrap();
        let back = Policy::from_json(&json).unwrap();
        assert_eq!(back, policy);
    }
}
