use anyhow::Result;
use async_trait::async_trait;

use crate::document::Document;

/// Sampling temperature sent with every generation request.
pub const TEMPERATURE: f32 = 0.7;

/// Nucleus sampling threshold sent with every generation request.
pub const TOP_P: f32 = 0.95;

/// Output mode that forces the service to answer with JSON text.
pub const JSON_RESPONSE_MIME: &str = "application/json";

/// Trait for hosted generative-AI services.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Send the prompt and document, returning the raw response text.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Sampling parameters for a generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            response_mime_type: JSON_RESPONSE_MIME.to_string(),
        }
    }
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub prompt: String,
    pub document: Document,
    pub config: GenerationConfig,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
