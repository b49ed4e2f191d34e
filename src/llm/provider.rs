//! Completion provider capability interface and implementations.
//!
//! The conflict resolver depends on a single-method capability trait rather
//! than any concrete model client, so the underlying API is swappable:
//! a hosted chat-completions client for production, a fallback chain for
//! resilience, a disabled stub for installations without an API key, and
//! hand-built fakes in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structured completion: merged content plus provider diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub diagnostics: Vec<String>,
}

/// Errors from a completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (connect, timeout, non-2xx).
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider replied but the payload was not the expected JSON shape.
    #[error("provider returned malformed payload: {0}")]
    Malformed(String),

    /// Client construction failed.
    #[error("provider client error: {0}")]
    Client(String),
}

/// Capability interface: complete a prompt into structured JSON.
///
/// Implementations must not panic; any failure is reported through
/// [`ProviderError`]. An unconfigured provider returns empty content with a
/// diagnostic rather than an error (see [`DisabledProvider`]).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete_json(&self, prompt: &str) -> Result<Completion, ProviderError>;
}

/// Stub used when no provider is configured.
///
/// Returns empty content with an explicit diagnostic so the resolver can
/// degrade to its left-content default instead of treating "not configured"
/// as an error.
pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    async fn complete_json(&self, _prompt: &str) -> Result<Completion, ProviderError> {
        Ok(Completion {
            content: String::new(),
            diagnostics: vec!["llm-disabled".to_string()],
        })
    }
}

/// Tries a primary provider, then a secondary on any error.
///
/// An empty-but-successful reply from the primary is passed through as-is;
/// the fallback only covers provider *failures*, not declined resolutions.
pub struct FallbackProvider {
    primary: Arc<dyn CompletionProvider>,
    secondary: Arc<dyn CompletionProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn CompletionProvider>, secondary: Arc<dyn CompletionProvider>) -> Self {
        FallbackProvider { primary, secondary }
    }
}

#[async_trait]
impl CompletionProvider for FallbackProvider {
    async fn complete_json(&self, prompt: &str) -> Result<Completion, ProviderError> {
        match self.primary.complete_json(prompt).await {
            Ok(completion) => Ok(completion),
            Err(error) => {
                tracing::warn!(%error, "primary completion provider failed, trying secondary");
                let mut completion = self.secondary.complete_json(prompt).await?;
                completion
                    .diagnostics
                    .push("llm-secondary-provider".to_string());
                Ok(completion)
            }
        }
    }
}

/// Default request timeout for hosted providers.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Hosted chat-completions client (OpenAI-style API shape).
///
/// Works against any endpoint implementing the `/chat/completions` contract;
/// the base URL and model name select between the primary inexpensive hosted
/// model and the secondary hosted-inference fallback.
pub struct HostedCompletionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// The JSON object the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct CompletionPayload {
    content: String,
    #[serde(default)]
    notes: Vec<String>,
}

impl HostedCompletionProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(HostedCompletionProvider {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl CompletionProvider for HostedCompletionProvider {
    async fn complete_json(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let body = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::Malformed("no choices in response".to_string()))?;

        let payload: CompletionPayload = serde_json::from_str(body)
            .map_err(|e| ProviderError::Malformed(format!("completion is not valid JSON: {e}")))?;

        Ok(Completion {
            content: payload.content,
            diagnostics: payload.notes,
        })
    }
}
