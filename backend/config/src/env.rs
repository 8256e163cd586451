//! Environment variables in config files and as overrides.
//!
//! String values may contain `${VAR_NAME}` references (uppercase names only),
//! resolved at load time. A handful of well-known variables then override
//! individual settings.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use crate::schema::EsprobeConfig;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex"));

/// A `${VAR}` reference to a variable that is unset or empty.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in every string leaf of a config tree.
pub fn resolve_env_vars(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    resolve_at(value, env, "")
}

fn resolve_at(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => resolve_string(s, env, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| resolve_at(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let child = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                out.insert(k.clone(), resolve_at(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    let mut missing = None;
    let resolved = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        match env.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(var_name) => Err(MissingEnvVarError {
            var_name,
            config_path: path.to_string(),
        }),
        None => Ok(resolved.into_owned()),
    }
}

/// Apply the well-known environment overrides on top of a loaded config.
pub fn apply_env_overrides(mut config: EsprobeConfig, env: &HashMap<String, String>) -> EsprobeConfig {
    let get = |name: &str| env.get(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("GEMINI_API_KEY") {
        config.gemini.api_key = Some(key.clone());
    }
    if let Some(model) = get("GEMINI_MODEL") {
        config.gemini.model = model.clone();
    }
    if let Some(bind) = get("ESPROBE_BIND") {
        config.server.bind_address = bind.clone();
    }
    if let Some(port) = get("ESPROBE_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "Ignoring invalid ESPROBE_PORT"),
        }
    }
    if let Some(dir) = get("ESPROBE_OUTPUT_DIR") {
        config.export.output_dir = dir.clone();
    }
    if let Some(level) = get("RUST_LOG") {
        config.logging.level = level.clone();
    }
    config
}
