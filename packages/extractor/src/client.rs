//! LLM transport.
//!
//! [`LlmClient`] is the seam the extractor talks through; [`AnthropicClient`]
//! speaks the Messages API over HTTP. A client makes exactly one attempt per
//! call and reports failures as typed errors so the pipeline can decide
//! whether to back off and retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, Result};

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Seconds to wait on a 429 without a usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion request: a system prompt plus the conversation so far.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Text of a completion with its token usage.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A chat-completion backend.
///
/// Implementations make a single attempt; retry policy belongs to the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// Model identifier recorded in extraction metadata.
    fn model(&self) -> Option<&str> {
        None
    }
}

/// Messages API client.
///
/// Holds the API key, so it intentionally has no `Debug` impl.
pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

/// Wire body of a Messages API call.
#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ReplyBlock>,
    #[serde(default)]
    usage: TokenUsage,
}

/// A content block; only text blocks carry `text`.
#[derive(Deserialize)]
struct ReplyBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct TokenUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicClient {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ExtractorError::LlmApiRequest)?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}{MESSAGES_PATH}",
                config.api_base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

/// Parse a `retry-after` header given in whole seconds.
fn retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Pull the human-readable message out of an API error body, falling back
/// to the raw body.
fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(ErrorEnvelope {
            error: Some(ErrorBody { message }),
        }) => message,
        _ => body,
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = MessagesBody {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &request.messages,
        };
        debug!(
            model = %self.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = retry_after(response.headers());
            warn!(retry_after_secs, "rate limited by LLM API");
            return Err(ExtractorError::LlmRateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let status = status.as_u16();
            let message = error_message(response.text().await.unwrap_or_default());
            if status >= 500 {
                warn!(status, message = %message, "LLM API server error");
            }
            return Err(ExtractorError::LlmApiError { status, message });
        }

        let reply: MessagesReply = response
            .json()
            .await
            .map_err(|e| ExtractorError::LlmResponseParse(format!("messages reply: {e}")))?;

        let content: String = reply.content.into_iter().filter_map(|b| b.text).collect();
        if content.trim().is_empty() {
            return Err(ExtractorError::LlmEmptyResponse);
        }

        debug!(
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "completion received"
        );
        Ok(LlmResponse {
            content,
            input_tokens: reply.usage.input_tokens,
            output_tokens: reply.usage.output_tokens,
        })
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

/// In-memory client for tests, behind `cfg(test)` or the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays scripted outcomes in order and records every request.
    /// Once the script runs out every call yields `LlmEmptyResponse`.
    pub struct MockLlmClient {
        script: Mutex<VecDeque<Result<LlmResponse>>>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmClient {
        pub fn new(outcomes: Vec<Result<LlmResponse>>) -> Self {
            Self {
                script: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(content: &str) -> Self {
            Self::with_responses(vec![content])
        }

        pub fn with_responses(contents: Vec<&str>) -> Self {
            Self::new(contents.into_iter().map(|c| Ok(text_response(c))).collect())
        }

        /// Requests received so far, oldest first.
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
        }
    }

    /// A successful reply carrying `content`.
    pub fn text_response(content: &str) -> LlmResponse {
        LlmResponse {
            content: content.to_string(),
            input_tokens: 100,
            output_tokens: 200,
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            self.script
                .lock()
                .ok()
                .and_then(|mut script| script.pop_front())
                .unwrap_or(Err(ExtractorError::LlmEmptyResponse))
        }

        fn model(&self) -> Option<&str> {
            Some("mock-model")
        }
    }
}
