mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default config locations, in lookup order.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./phaseforged.toml",
    "~/.config/phaseforged/config.toml",
    "/etc/phaseforged/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn validate_config(config: &Config) -> Result<()> {
    if config.engine.workers == 0 {
        anyhow::bail!("engine.workers must be at least 1");
    }

    if config.executor.timeout_secs == 0 {
        anyhow::bail!("executor.timeout_secs must be greater than 0");
    }

    if config.probe.snapshot_suffix.trim_matches('.').is_empty() {
        anyhow::bail!("probe.snapshot_suffix cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_pipeline::ExecutorKind;
    use pf_rules::OnErrorMode;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.engine.default_on_error, OnErrorMode::Continue);
        assert_eq!(config.engine.workers, 1);
        assert_eq!(config.probe.snapshot_suffix, "probe.json");
        assert_eq!(config.executor.kind, ExecutorKind::Command);
        assert_eq!(config.executor.timeout_secs, 300);
    }

    #[test]
    fn full_config() {
        let config = parse_config(
            r#"
[engine]
default_on_error = "stop"
workers = 4

[probe]
snapshot_suffix = "meta.json"

[executor]
kind = "dry-run"
timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(config.engine.default_on_error, OnErrorMode::Stop);
        assert_eq!(config.engine.workers, 4);
        assert_eq!(config.probe.snapshot_suffix, "meta.json");
        assert_eq!(config.executor.kind, ExecutorKind::DryRun);
        assert_eq!(config.executor.timeout_secs, 30);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse_config("[engine]\nworkers = 0").is_err());
        assert!(parse_config("[executor]\ntimeout_secs = 0").is_err());
        assert!(parse_config("[probe]\nsnapshot_suffix = \".\"").is_err());
        assert!(parse_config("[engine]\ndefault_on_error = \"explode\"").is_err());
        assert!(parse_config("[server]\nport = 1").is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[engine]\nworkers = 3\n").unwrap();
        let config = load_config_or_default(Some(file.path())).unwrap();
        assert_eq!(config.engine.workers, 3);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_or_default(Some(Path::new("/nonexistent/phaseforged.toml")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }
}
