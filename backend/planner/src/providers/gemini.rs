use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use esprobe_core::{LlmProvider, LlmRequest, LlmResponse};
use esprobe_logging::redact_sensitive_data;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Google Gemini `generateContent` provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;
        Ok(self)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfigBody,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody {
    temperature: f32,
    top_p: f32,
    response_mime_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.document.mime_type().to_string(),
                            data: STANDARD.encode(request.document.bytes()),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfigBody {
                temperature: request.config.temperature,
                top_p: request.config.top_p,
                response_mime_type: request.config.response_mime_type.clone(),
            },
        };

        debug!(
            model = %request.model,
            document_bytes = request.document.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini returned {}: {}",
                status,
                redact_sensitive_data(&error_body)
            );
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let content: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.is_empty() {
            anyhow::bail!("Gemini response contained no candidate text");
        }

        let tokens_used = parsed
            .usage_metadata
            .and_then(|u| u.total_token_count)
            .unwrap_or(0);

        Ok(LlmResponse {
            content,
            provider: "gemini".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use esprobe_core::{Document, GenerationConfig};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request() -> LlmRequest {
        LlmRequest {
            model: DEFAULT_MODEL.to_string(),
            prompt: "prompt".to_string(),
            document: Document::from_bytes("es.pdf", b"%PDF-1.4".to_vec()).unwrap(),
            config: GenerationConfig::default(),
        }
    }

    #[tokio::test]
    async fn sends_prompt_document_and_config() {
        let app = Router::new().route(
            "/models/:call",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-goog-api-key"], "test-key");
                let parts = &body["contents"][0]["parts"];
                assert_eq!(parts[0]["text"], "prompt");
                assert_eq!(parts[1]["inlineData"]["mimeType"], "application/pdf");
                assert_eq!(parts[1]["inlineData"]["data"], STANDARD.encode(b"%PDF-1.4"));
                let config = &body["generationConfig"];
                assert_eq!(config["responseMimeType"], "application/json");
                assert!((config["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
                assert!((config["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": "[" }, { "text": "]" }] } }],
                    "usageMetadata": { "totalTokenCount": 42 }
                }))
            }),
        );
        let base = spawn_server(app).await;

        let provider = GeminiProvider::new("test-key").with_base_url(base);
        let response = provider.generate(&request()).await.unwrap();
        assert_eq!(response.content, "[]");
        assert_eq!(response.tokens_used, 42);
        assert_eq!(response.provider, "gemini");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = Router::new().route(
            "/models/:call",
            post(|| async { (StatusCode::FORBIDDEN, "API key not valid") }),
        );
        let base = spawn_server(app).await;

        let provider = GeminiProvider::new("bad").with_base_url(base);
        let err = provider.generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn error_body_keys_are_scrubbed() {
        let leaked = format!("AIza{}", "k".repeat(35));
        let body = format!("API key not valid: {leaked}");
        let app = Router::new().route(
            "/models/:call",
            post(move || {
                let body = body.clone();
                async move { (StatusCode::BAD_REQUEST, body) }
            }),
        );
        let base = spawn_server(app).await;

        let provider = GeminiProvider::new("bad").with_base_url(base);
        let err = format!("{:#}", provider.generate(&request()).await.unwrap_err());
        assert!(err.contains("API key not valid"));
        assert!(!err.contains(&leaked));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let app = Router::new().route(
            "/models/:call",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base = spawn_server(app).await;

        let provider = GeminiProvider::new("k").with_base_url(base);
        assert!(provider.generate(&request()).await.is_err());
    }
}
