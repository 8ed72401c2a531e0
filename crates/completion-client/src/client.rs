use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::types::{ChatBody, ChatMessage, ChatReply, ResponseFormat};
use crate::{CompletionError, CompletionRequest, CompletionResponse, ResponseShape, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Boxed future returned by [`Completion::complete`], keeps the trait object-safe.
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse>> + Send + 'a>>;

/// A text-completion service: one instruction in, generated text out.
///
/// Implemented by [`OpenAiClient`] for real traffic and by test doubles in
/// downstream crates.
pub trait Completion: Send + Sync {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_>;
}

// ─── Settings ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    /// Name of the env var the key came from; only used in error messages.
    pub api_key_env: String,
    pub api_key: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
        }
    }
}

// ─── OpenAiClient ─────────────────────────────────────────────────────────

/// Client for any endpoint speaking the OpenAI `chat/completions` protocol.
pub struct OpenAiClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl OpenAiClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(CompletionError::Transport)?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CompletionError::MissingApiKey(self.settings.api_key_env.clone()))?;

        let model = request.model.as_deref().unwrap_or(&self.settings.model);
        let body = ChatBody {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            response_format: match request.shape {
                ResponseShape::Json => Some(ResponseFormat {
                    kind: "json_object",
                }),
                ResponseShape::Text => None,
            },
        };

        tracing::debug!(model, shape = ?request.shape, "sending completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let reply: ChatReply = serde_json::from_slice(&bytes)
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::NoChoices)?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: reply.model,
            usage: reply.usage,
        })
    }

    fn classify(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(self.settings.timeout.as_secs())
        } else {
            CompletionError::Transport(err)
        }
    }
}

impl Completion for OpenAiClient {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(self.send(request))
    }
}
