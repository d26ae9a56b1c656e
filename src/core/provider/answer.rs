//! Conversational answer client.
//!
//! Talks to an OpenAI-compatible chat completions endpoint. The caller
//! supplies a preamble (sent as the system message) and the conversation so
//! far; the client returns the assistant's reply as plain text.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::retry::{RetryPolicy, with_retry};
use super::{ProviderError, ProviderResult, build_http_client};

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Configuration for the answer provider.
#[derive(Debug, Clone)]
pub struct AnswerConfig {
    /// API key. Completion fails fast when unset.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API, without the endpoint path.
    pub base_url: String,
    pub model: String,
    /// Cap on answer length. Answers are spoken, so they stay short.
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the chat completions API.
pub struct AnswerClient {
    client: reqwest::Client,
    config: AnswerConfig,
    retry: RetryPolicy,
}

impl AnswerClient {
    pub fn new(config: AnswerConfig, retry: RetryPolicy) -> ProviderResult<Self> {
        let client = build_http_client(config.request_timeout)?;
        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Produces an answer to the conversation, grounded by `preamble`.
    ///
    /// The preamble becomes the system message; `messages` follow in order.
    /// Transient provider failures are retried per the client's retry policy.
    pub async fn complete(
        &self,
        preamble: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured("Answer provider API key is not set".to_string())
        })?;

        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(json!({ "role": "system", "content": preamble }));
        for message in messages {
            wire.push(json!({ "role": message.role, "content": message.content }));
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": wire,
            "max_tokens": self.config.max_tokens,
        });
        let client = &self.client;

        with_retry(&self.retry, "Answer generation", move || {
            let request = client.post(url.as_str()).bearer_auth(api_key).json(&body);
            async move {
                let response = request.send().await.map_err(ProviderError::from_reqwest)?;
                let status = response.status();
                if !status.is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Status {
                        status: status.as_u16(),
                        detail,
                    });
                }
                let payload: serde_json::Value =
                    response.json().await.map_err(ProviderError::from_reqwest)?;
                let answer = payload["choices"][0]["message"]["content"]
                    .as_str()
                    .ok_or_else(|| {
                        ProviderError::InvalidResponse(
                            "Completion missing message content".to_string(),
                        )
                    })?;
                let answer = answer.trim();
                if answer.is_empty() {
                    return Err(ProviderError::InvalidResponse(
                        "Completion content is empty".to_string(),
                    ));
                }
                Ok(answer.to_string())
            }
        })
        .await
    }
}
