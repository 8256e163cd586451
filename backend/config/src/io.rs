//! Config file discovery and loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::env::{apply_env_overrides, resolve_env_vars};
use crate::schema::EsprobeConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the esprobe config directory.
/// Priority: `ESPROBE_CONFIG_DIR` env > `~/.esprobe/` > `./.esprobe/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ESPROBE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".esprobe"))
        .unwrap_or_else(|| PathBuf::from(".esprobe"))
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read a YAML config file and substitute `${VAR}` references from `env`.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path, env: &HashMap<String, String>) -> Result<EsprobeConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(EsprobeConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file deserializes to null.
    let value: Value = serde_yaml::from_str::<Option<Value>>(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?
        .unwrap_or_else(|| Value::Object(Default::default()));

    let value = resolve_env_vars(&value, env).context("Failed to resolve env vars in config")?;

    let config: EsprobeConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load the config file (explicit path or the default location), then apply
/// environment overrides from `env`.
pub async fn load_with_env(
    path: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<EsprobeConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path(&config_dir()),
    };
    let config = load_config(&path, env).await?;
    Ok(apply_env_overrides(config, env))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.yaml"), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(config, EsprobeConfig::default());
    }

    #[tokio::test]
    async fn empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        let config = load_config(&path, &HashMap::new()).await.unwrap();
        assert_eq!(config, EsprobeConfig::default());
    }

    #[tokio::test]
    async fn file_references_and_overrides_combine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "gemini:\n  apiKey: \"${TEAM_GEMINI_KEY}\"\n  model: gemini-2.5-flash\ngeneration:\n  strictLayout: true\n",
        )
        .unwrap();

        let config = load_with_env(
            Some(&path),
            &env(&[("TEAM_GEMINI_KEY", "AIzaFromFile"), ("GEMINI_MODEL", "gemini-pro")]),
        )
        .await
        .unwrap();

        assert_eq!(config.gemini.api_key.as_deref(), Some("AIzaFromFile"));
        assert_eq!(config.gemini.model, "gemini-pro");
        assert!(config.generation.strict_layout);
    }

    #[tokio::test]
    async fn unresolved_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "gemini:\n  apiKey: \"${NOT_SET_ANYWHERE}\"\n").unwrap();

        let err = load_config(&path, &HashMap::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("NOT_SET_ANYWHERE"));
    }

    #[tokio::test]
    async fn invalid_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server: [unclosed").unwrap();
        assert!(load_config(&path, &HashMap::new()).await.is_err());
    }
}
