use std::sync::Arc;

use tracing::{info, warn};

use esprobe_core::{
    Document, EsprobeError, GenerationConfig, LlmProvider, LlmRequest, QuestionTable, Result,
};

use esprobe_logging::redact_sensitive_data;

use crate::parser::{check_layout, parse_response};
use crate::prompt::QUESTION_PROMPT;

/// How much of the prompt contract is checked after parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Accept any structurally valid response.
    #[default]
    Trust,
    /// Also require the five known sections with three questions each.
    Strict,
}

/// Sends an entry sheet to the model and turns the answer into a question table.
pub struct QuestionGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    prompt: String,
    config: GenerationConfig,
    policy: LayoutPolicy,
}

impl QuestionGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            prompt: QUESTION_PROMPT.to_string(),
            config: GenerationConfig::default(),
            policy: LayoutPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LayoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LayoutPolicy {
        self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One request, no retry. Either a complete table or an error.
    pub async fn generate(&self, document: &Document) -> Result<QuestionTable> {
        let request = LlmRequest {
            model: self.model.clone(),
            prompt: self.prompt.clone(),
            document: document.clone(),
            config: self.config.clone(),
        };

        info!(
            provider = %self.provider.name(),
            model = %self.model,
            document = %document.file_name(),
            "Generating question sheet"
        );

        let response = self.provider.generate(&request).await.map_err(|e| {
            let detail = redact_sensitive_data(&format!("{e:#}"));
            warn!(provider = %self.provider.name(), error = %detail, "Generation failed");
            EsprobeError::generation(self.provider.name(), detail)
        })?;

        let table = parse_response(&response.content).map_err(|e| {
            warn!(error = %e, "Model response rejected by parser");
            e
        })?;

        if self.policy == LayoutPolicy::Strict {
            check_layout(&table)?;
        }

        info!(
            provider = %response.provider,
            rows = table.len(),
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Question sheet generated"
        );
        Ok(table)
    }
}
