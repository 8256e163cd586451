//! Runtime configuration for esprobe.
//!
//! Provides:
//! - Typed config schema with defaults
//! - YAML loading with `${ENV_VAR}` substitution
//! - Environment overrides (`GEMINI_API_KEY`, `ESPROBE_PORT`, ...)
//! - Validation report and redaction for safe display

pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, resolve_env_vars, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_with_env};
pub use redact::{mask_secret, redact};
pub use schema::EsprobeConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load the config file and apply overrides from the process environment.
pub async fn load(path: Option<&Path>) -> Result<EsprobeConfig> {
    let env = std::env::vars().collect();
    load_with_env(path, &env).await
}

/// Log every validation finding and fail on the first error.
///
/// Call after the logger is installed so warnings are visible.
pub fn ensure_valid(config: &EsprobeConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EsprobeConfig::default();
        assert!(ensure_valid(&config).is_ok());

        config.server.port = 0;
        let err = ensure_valid(&config).unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }
}
