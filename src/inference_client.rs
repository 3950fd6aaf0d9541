use crate::config::InferenceConfig;
use crate::models::chat::PromptMessage;
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Marker that starts every reply synthesized from a failed inference call.
pub const DEGRADED_REPLY_PREFIX: &str = "⚠️ Error:";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("inference API token is not configured")]
    NotConfigured,
    #[error("inference request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("inference API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed inference response: {0}")]
    Malformed(String),
    #[error("inference response contained no reply")]
    EmptyReply,
}

impl GatewayError {
    /// The text shown (and remembered) in place of a model reply.
    pub fn degraded_reply(&self) -> String {
        format!("{} {}", DEGRADED_REPLY_PREFIX, self)
    }
}

/// Turns an ordered prompt into a generated reply.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn complete(&self, model: &str, messages: &[PromptMessage]) -> Result<String, GatewayError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
/// (the Hugging Face inference router by default).
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    client: Client,
    api_token: String,
    base_url: String,
    request_timeout: Duration,
    retry_window: Duration,
}

impl HuggingFaceClient {
    pub fn new(api_token: String, config: &InferenceConfig) -> Self {
        Self {
            client: Client::new(),
            api_token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            retry_window: config.retry_window,
        }
    }
}

#[async_trait]
impl InferenceGateway for HuggingFaceClient {
    async fn complete(&self, model: &str, messages: &[PromptMessage]) -> Result<String, GatewayError> {
        let request = ChatCompletionRequest {
            model,
            messages,
            max_tokens: 1024,
        };

        tracing::debug!("Inference request: model {}, {} messages", model, messages.len());

        let backoff_config = ExponentialBackoff {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            max_elapsed_time: Some(self.retry_window),
            ..Default::default()
        };

        let operation = || async {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_token)
                .timeout(self.request_timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        tracing::warn!("Inference request timed out (retrying)");
                        backoff::Error::transient(GatewayError::Timeout)
                    } else if e.is_connect() {
                        tracing::warn!("Inference connection error (retrying): {}", e);
                        backoff::Error::transient(GatewayError::Network(e.to_string()))
                    } else {
                        tracing::error!("Inference request error: {}", e);
                        backoff::Error::permanent(GatewayError::Network(e.to_string()))
                    }
                })?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                if e.is_timeout() {
                    backoff::Error::transient(GatewayError::Timeout)
                } else {
                    backoff::Error::permanent(GatewayError::Network(e.to_string()))
                }
            })?;

            if !status.is_success() {
                let err = GatewayError::Status { status: status.as_u16(), body: truncate(&body, 500) };
                if is_transient_status(status) {
                    tracing::warn!("Inference API returned {} (retrying)", status);
                    return Err(backoff::Error::transient(err));
                }
                tracing::error!("Inference API permanent error ({})", status);
                return Err(backoff::Error::permanent(err));
            }

            parse_reply(&body).map_err(backoff::Error::permanent)
        };

        // Backoff only checks the window between attempts; this also bounds the last one
        match tokio::time::timeout(self.retry_window, retry(backoff_config, operation)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Inference gave up after {:?}", self.retry_window);
                Err(GatewayError::Timeout)
            }
        }
    }
}

/// Installed when no API token is available; every call fails, so chat keeps
/// answering with a degraded reply.
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredGateway;

#[async_trait]
impl InferenceGateway for UnconfiguredGateway {
    async fn complete(&self, _model: &str, _messages: &[PromptMessage]) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

fn parse_reply(body: &str) -> Result<String, GatewayError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;

    let reply = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if reply.is_empty() {
        return Err(GatewayError::EmptyReply);
    }
    Ok(reply)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
