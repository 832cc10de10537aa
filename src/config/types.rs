use pf_pipeline::ExecutorKind;
use pf_probe::snapshot::DEFAULT_SNAPSHOT_SUFFIX;
use pf_rules::OnErrorMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Error mode for policies that do not set `config.on_error`
    #[serde(default)]
    pub default_on_error: OnErrorMode,

    /// Files processed concurrently by `run`
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_on_error: OnErrorMode::default(),
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Sidecar suffix: metadata for `movie.mkv` is read from
    /// `movie.mkv.<suffix>`
    #[serde(default = "default_snapshot_suffix")]
    pub snapshot_suffix: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            snapshot_suffix: default_snapshot_suffix(),
        }
    }
}

fn default_snapshot_suffix() -> String {
    DEFAULT_SNAPSHOT_SUFFIX.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub kind: ExecutorKind,

    /// Per-command timeout in seconds (default: 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}
