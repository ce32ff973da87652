/// LLM Client: the single point of entry for all Gemini API calls.
///
/// No other module may call the Gemini API directly; everything goes through
/// the `TextGenerator` trait so the pipeline can run against stubs.
///
/// One prompt in, one block of text out. No streaming, no retries: retry
/// policy belongs to the caller.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt or response blocked: {0}")]
    Blocked(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call exceeded {}s deadline", .0.as_secs())]
    Timeout(Duration),
}

/// Anything that turns a prompt into raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` client. Cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: config.google_api_key.clone(),
            endpoint: format!(
                "{}/{}:generateContent",
                config.gemini_api_base.trim_end_matches('/'),
                config.gemini_model
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Makes exactly one call to the Gemini API and returns the full response object.
    pub async fn call(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Calling Gemini ({} prompt chars)", prompt.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(LlmError::Blocked(reason));
        }

        match response.text() {
            Some(text) => Ok(text),
            None => match response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
            {
                Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST")) => {
                    Err(LlmError::Blocked(reason.to_string()))
                }
                _ => Err(LlmError::EmptyContent),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        Json, Router,
    };
    use serde_json::{json, Value};

    fn config_for(base: &str) -> Config {
        Config::from_vars(|key| match key {
            "GOOGLE_API_KEY" => Some("test-key".to_string()),
            "GEMINI_API_BASE" => Some(base.to_string()),
            "GEMINI_MODEL" => Some("gemini-test".to_string()),
            _ => None,
        })
        .unwrap()
    }

    /// Starts a local Gemini stand-in that answers every request with `status` and `body`.
    /// It checks the API key header and request shape before answering.
    async fn spawn_stub(status: StatusCode, body: Value) -> String {
        let app = Router::new().fallback(move |headers: HeaderMap, Json(req): Json<Value>| {
            let body = body.clone();
            async move {
                assert_eq!(
                    headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()),
                    Some("test-key")
                );
                assert_eq!(req["contents"][0]["role"], "user");
                assert!(req["contents"][0]["parts"][0]["text"].is_string());
                (status, Json(body))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1beta/models")
    }

    #[test]
    fn test_endpoint_built_from_config() {
        let client = GeminiClient::new(&config_for("https://example.test/v1beta/models/")).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"score\":"}, {"text": " \"80/100\"}"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"score\": \"80/100\"}"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let base = spawn_stub(
            StatusCode::OK,
            json!({
                "candidates": [{"content": {"parts": [{"text": "{\"ok\": true}"}]}}],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
            }),
        )
        .await;
        let client = GeminiClient::new(&config_for(&base)).unwrap();
        let text = client.generate("Analyze this resume").await.unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_auth_failure_is_api_error_with_message() {
        let base = spawn_stub(
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}),
        )
        .await;
        let client = GeminiClient::new(&config_for(&base)).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_reported() {
        let base = spawn_stub(
            StatusCode::OK,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        )
        .await;
        let client = GeminiClient::new(&config_for(&base)).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Blocked(reason) if reason == "SAFETY"));
    }

    #[tokio::test]
    async fn test_empty_candidate_is_empty_content() {
        let base = spawn_stub(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": []}, "finishReason": "STOP"}]}),
        )
        .await;
        let client = GeminiClient::new(&config_for(&base)).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            GeminiClient::new(&config_for(&format!("http://{addr}/v1beta/models"))).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }
}
