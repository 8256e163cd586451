//! esprobe runtime configuration schema.
//!
//! Every section has defaults, so an empty YAML file (or none at all) is a
//! valid configuration apart from the API key.

use serde::{Deserialize, Serialize};

use esprobe_core::{EsprobeError, Result};

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;
pub const DEFAULT_OUTPUT_DIR: &str = ".";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EsprobeConfig {
    /// Gemini service access
    pub gemini: GeminiConfig,

    /// How model output is checked
    pub generation: GenerationSettings,

    /// HTTP API server
    pub server: ServerConfig,

    /// File exports
    pub export: ExportConfig,

    /// Logging
    pub logging: LoggingConfig,
}

impl EsprobeConfig {
    /// The API key, or the fatal startup error when it is missing.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.gemini.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(EsprobeError::Configuration(
                "GEMINI_API_KEY is not set".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Reject responses that do not have exactly 3 questions in each of the
    /// five sections.
    pub strict_layout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Sessions unused for this long are ended and their data dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: EsprobeConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EsprobeConfig::default());
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert!(!config.generation.strict_layout);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "gemini:\n  model: gemini-2.5-pro\nserver:\n  port: 9000\n";
        let config: EsprobeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, DEFAULT_BIND);
        assert_eq!(config.server.session_idle_secs, DEFAULT_SESSION_IDLE_SECS);
    }

    #[test]
    fn missing_or_blank_key_is_configuration_error() {
        let mut config = EsprobeConfig::default();
        assert!(matches!(
            config.require_api_key().unwrap_err(),
            EsprobeError::Configuration(_)
        ));

        config.gemini.api_key = Some("  ".into());
        assert!(config.require_api_key().is_err());

        config.gemini.api_key = Some("AIza-test".into());
        assert_eq!(config.require_api_key().unwrap(), "AIza-test");
    }
}
