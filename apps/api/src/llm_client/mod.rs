/// LLM Client: the single point of entry for all Gemini calls in the screener.
///
/// No other module talks to the model API directly. The pipeline depends on the
/// `Inference` trait so handlers and tests can run against a stub.
///
/// Model: gemini-2.0-flash (hardcoded; there is exactly one backend)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analysis::prompts::AnalysisPrompt;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// The model used for every analysis.
pub const MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content ({reason})")]
    EmptyContent { reason: String },
}

/// Raw text returned by the model. May or may not contain the requested JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCompletion {
    text: String,
    usage: Option<Usage>,
}

impl ModelCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

/// Anything that can turn a prompt into a completion.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn invoke(&self, prompt: &AnalysisPrompt) -> Result<ModelCompletion, LlmError>;
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
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<Usage>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_completion(self) -> Result<ModelCompletion, LlmError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyContent {
                reason: block_reason
                    .map(|r| format!("prompt blocked: {r}"))
                    .unwrap_or_else(|| "no candidates".to_string()),
            })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent {
                reason: format!(
                    "finish reason: {}",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }

        Ok(ModelCompletion {
            text,
            usage: self.usage_metadata,
        })
    }
}

/// Gemini `generateContent` client. One request per call; no retries.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different host, e.g. a local stub in tests.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{MODEL}:generateContent", self.base_url)
    }

    /// Makes a single call to the model and returns its text completion.
    pub async fn generate(&self, prompt: &str) -> Result<ModelCompletion, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
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
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion = response
            .json::<GenerateContentResponse>()
            .await?
            .into_completion()?;

        if let Some(usage) = completion.usage() {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl Inference for LlmClient {
    async fn invoke(&self, prompt: &AnalysisPrompt) -> Result<ModelCompletion, LlmError> {
        self.generate(prompt.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prompts::build_prompt;
    use axum::{
        http::{HeaderMap, Method, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::{json, Value};

    // The model path contains a ':' mid-segment, which the router would read
    // as a capture, so stubs answer on the fallback and check the path themselves.

    /// Serves `router` on an ephemeral port and returns its base URL.
    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn assert_generate_call(method: &Method, uri: &Uri) {
        assert_eq!(method, Method::POST);
        assert_eq!(
            uri.path(),
            format!("/v1beta/models/{MODEL}:generateContent")
        );
    }

    #[tokio::test]
    async fn test_generate_returns_concatenated_parts() {
        let router = Router::new().fallback(
            |method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_generate_call(&method, &uri);
                assert_eq!(headers["x-goog-api-key"], "test-key");
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
                assert!(prompt.contains("resume: RESUME"));
                Json(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]},
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
                }))
            },
        );
        let base = spawn_stub(router).await;
        let client = LlmClient::new("test-key".to_string())
            .unwrap()
            .with_base_url(base);

        let completion = client.invoke(&build_prompt("RESUME", "JOB")).await.unwrap();
        assert_eq!(completion.text(), "Hello, world");
        assert_eq!(completion.usage().unwrap().prompt_token_count, 12);
    }

    #[tokio::test]
    async fn test_error_status_surfaces_service_message() {
        let router = Router::new().fallback(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}})),
            )
        });
        let base = spawn_stub(router).await;
        let client = LlmClient::new("bad".to_string()).unwrap().with_base_url(base);

        match client.generate("prompt").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_quota_error_with_plain_body_is_kept_verbatim() {
        let router = Router::new()
            .fallback(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") });
        let base = spawn_stub(router).await;
        let client = LlmClient::new("k".to_string()).unwrap().with_base_url(base);

        match client.generate("prompt").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_empty_content() {
        let router = Router::new()
            .fallback(|| async { Json(json!({"promptFeedback": {"blockReason": "SAFETY"}})) });
        let base = spawn_stub(router).await;
        let client = LlmClient::new("k".to_string()).unwrap().with_base_url(base);

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent { .. }));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_candidate_without_text_is_empty_content() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        let err = response.into_completion().unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = LlmClient::new("k".to_string())
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
