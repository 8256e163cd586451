//! Config validation with field paths in every message.

use crate::schema::EsprobeConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
///
/// A missing API key is only a warning here; commands that call the service
/// refuse to start without one.
pub fn validate(config: &EsprobeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    let gemini = &config.gemini;
    if gemini.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        report.warn("gemini.apiKey", "No API key configured; generation will not start");
    }
    if gemini.model.trim().is_empty() {
        report.error("gemini.model", "Model name cannot be empty");
    }
    if !(gemini.base_url.starts_with("https://") || gemini.base_url.starts_with("http://")) {
        report.error("gemini.baseUrl", "Base URL must start with http:// or https://");
    }
    if gemini.timeout_secs == 0 {
        report.error("gemini.timeoutSecs", "Timeout must be greater than zero");
    }

    if config.server.port == 0 {
        report.error("server.port", "Port cannot be 0");
    }
    if config.server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be greater than zero");
    }
    if config.server.session_idle_secs == 0 {
        report.error("server.sessionIdleSecs", "Session idle timeout must be greater than zero");
    }

    if config.export.output_dir.trim().is_empty() {
        report.error("export.outputDir", "Output directory cannot be empty");
    }

    report
}
