//! Speech synthesis client.

use bytes::Bytes;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::retry::{RetryPolicy, with_retry};
use super::text::{TextNormalizer, truncate_to_sentence};
use super::{ProviderError, ProviderResult, build_http_client};
use crate::core::tier::VoiceProfile;

/// Configuration for the speech synthesis provider.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// API key. Synthesis fails fast when unset.
    pub api_key: Option<String>,
    /// Base URL, up to but not including the voice id path segment.
    pub base_url: String,
    /// Synthesis model id.
    pub model: String,
    /// Output audio format, e.g. `mp3_44100_128`.
    pub output_format: String,
    /// Hard ceiling on input length, in characters.
    pub max_text_len: usize,
    /// Where the sentence-boundary cut may land, in characters.
    pub safe_truncate_len: usize,
    pub request_timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.elevenlabs.io/v1/text-to-speech".to_string(),
            model: "eleven_v3".to_string(),
            output_format: "mp3_44100_128".to_string(),
            max_text_len: 5000,
            safe_truncate_len: 4500,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the speech synthesis API.
pub struct SpeechClient {
    client: reqwest::Client,
    config: SpeechConfig,
    retry: RetryPolicy,
    normalizer: TextNormalizer,
}

impl SpeechClient {
    pub fn new(config: SpeechConfig, retry: RetryPolicy) -> ProviderResult<Self> {
        let client = build_http_client(config.request_timeout)?;
        let normalizer = TextNormalizer::new()
            .map_err(|e| ProviderError::NotConfigured(format!("Bad normalizer pattern: {e}")))?;
        Ok(Self {
            client,
            config,
            retry,
            normalizer,
        })
    }

    /// MIME type of the audio the provider will return.
    pub fn content_type(&self) -> &'static str {
        let format = self.config.output_format.as_str();
        if format.starts_with("mp3") {
            "audio/mpeg"
        } else if format.starts_with("pcm") {
            "audio/pcm"
        } else if format.starts_with("ulaw") {
            "audio/basic"
        } else if format.starts_with("opus") {
            "audio/ogg"
        } else {
            "application/octet-stream"
        }
    }

    /// Synthesizes `text` with the given voice and returns the raw audio.
    ///
    /// Text is normalized and, when overlong, cut at a sentence boundary
    /// before it is sent. Transient provider failures are retried per the
    /// client's retry policy.
    pub async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> ProviderResult<Bytes> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured("Speech provider API key is not set".to_string())
        })?;

        let normalized = self.normalizer.normalize(text);
        let speakable = truncate_to_sentence(
            &normalized,
            self.config.max_text_len,
            self.config.safe_truncate_len,
        );
        if speakable.len() < normalized.len() {
            debug!(
                "Truncated synthesis input from {} to {} chars",
                normalized.chars().count(),
                speakable.chars().count()
            );
        }

        let url = format!(
            "{}/{}?output_format={}",
            self.config.base_url.trim_end_matches('/'),
            voice.voice_id,
            self.config.output_format
        );
        let body = json!({
            "text": speakable,
            "model_id": self.config.model,
            "voice_settings": voice.settings,
        });
        let accept = self.content_type();
        let client = &self.client;

        with_retry(&self.retry, "Speech synthesis", move || {
            let request = client
                .post(url.as_str())
                .header("xi-api-key", api_key)
                .header("Content-Type", "application/json")
                .header("Accept", accept)
                .json(&body);
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
                let bytes = response.bytes().await.map_err(ProviderError::from_reqwest)?;
                if bytes.is_empty() {
                    return Err(ProviderError::InvalidResponse(
                        "Empty audio payload".to_string(),
                    ));
                }
                Ok(bytes)
            }
        })
        .await
    }
}
