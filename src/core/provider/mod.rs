//! Outbound provider clients.
//!
//! Two providers back the narration pipeline: a speech synthesis API and a
//! chat-completions API for conversational answers. Both share the same
//! error classification and retry behavior; transient failures (5xx, 429,
//! timeouts, connection drops) are retried with doubling backoff, anything
//! else fails the request immediately.

pub mod answer;
pub mod retry;
pub mod speech;
pub mod text;

use std::time::Duration;
use thiserror::Error;

pub use answer::{AnswerClient, AnswerConfig, ChatMessage};
pub use retry::{RetryPolicy, with_retry};
pub use speech::{SpeechClient, SpeechConfig};
pub use text::{TextNormalizer, truncate_to_sentence};

/// Errors that can occur when talking to a provider.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Provider answered with a non-success status.
    #[error("Provider returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The request timed out.
    #[error("Provider request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("Provider connection failed: {0}")]
    ConnectionFailed(String),

    /// The provider answered, but not with anything usable.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The client is missing required configuration (usually an API key).
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether a retry could plausibly change the outcome.
    ///
    /// 5xx and 429 are provider-side or pressure conditions; timeouts and
    /// connection failures are network weather. Everything else (other 4xx,
    /// malformed responses, missing configuration) will fail the same way
    /// again.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Timeout | ProviderError::ConnectionFailed(_) => true,
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::ConnectionFailed(err.to_string())
        } else {
            ProviderError::InvalidResponse(err.to_string())
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_http_client(request_timeout: Duration) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ProviderError::ConnectionFailed(e.to_string()))
}
