//! Narration generation service.
//!
//! Single entry point for producing narrated content. Every request runs the
//! same pipeline: cache probe, admission, provider call, artifact store,
//! cache record. A cache hit answers immediately and consumes no admission
//! budget; any downstream failure degrades to `None` rather than an error,
//! so callers treat missing narration as a soft condition.
//!
//! Two concurrent requests for the same key can both miss the cache and both
//! generate. Artifacts are content-addressed, so both write the same blob and
//! the duplicate provider call is the only cost. Keys are deliberately never
//! locked across processes.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cache::{CacheEntry, NarrationCache};
use super::limiter::FixedWindowLimiter;
use super::provider::{AnswerClient, ChatMessage, SpeechClient};
use super::store::{ArtifactRef, BlobStore};
use super::tier::{Tier, TierVoices};

/// What to generate when the cache has no answer for a key.
#[derive(Debug, Clone)]
pub enum NarrationPayload {
    /// Synthesize spoken audio from prose.
    Speech { text: String },
    /// Produce a conversational answer, stored as plain text.
    Answer {
        preamble: String,
        messages: Vec<ChatMessage>,
    },
}

/// Cache-aware narration dispatcher.
pub struct NarrationService {
    cache: NarrationCache,
    blobs: Arc<dyn BlobStore>,
    speech: SpeechClient,
    answers: AnswerClient,
    speech_limiter: FixedWindowLimiter,
    answer_limiter: FixedWindowLimiter,
    voices: TierVoices,
}

impl NarrationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: NarrationCache,
        blobs: Arc<dyn BlobStore>,
        speech: SpeechClient,
        answers: AnswerClient,
        speech_limiter: FixedWindowLimiter,
        answer_limiter: FixedWindowLimiter,
        voices: TierVoices,
    ) -> Self {
        Self {
            cache,
            blobs,
            speech,
            answers,
            speech_limiter,
            answer_limiter,
            voices,
        }
    }

    /// Returns the artifact for `key`, generating it on a cache miss.
    ///
    /// The cache probe comes first: a hit returns without touching admission
    /// or providers, so replaying already-generated content is always free.
    /// On a miss, non-narrator tiers pass through admission control keyed by
    /// `subject`; a rejected request returns `None` without generating.
    ///
    /// Returns `None` when admission rejects the request, the provider fails
    /// after retries, or the artifact cannot be persisted. All failures are
    /// logged server-side and deliberately not surfaced to the caller.
    pub async fn generate(
        &self,
        key: &str,
        tier: Tier,
        payload: NarrationPayload,
        subject: &str,
    ) -> Option<ArtifactRef> {
        match self.cache.lookup(key).await {
            Ok(Some(entry)) => {
                debug!("Narration for {} already generated: {}", key, entry.artifact);
                return Some(entry.artifact);
            }
            Ok(None) => {}
            Err(e) => {
                // Treat an unreadable cache as a miss and regenerate.
                warn!("Narration cache probe failed for {}: {}", key, e);
            }
        }

        if !tier.skips_admission() {
            let limiter = match &payload {
                NarrationPayload::Speech { .. } => &self.speech_limiter,
                NarrationPayload::Answer { .. } => &self.answer_limiter,
            };
            match limiter.admit(subject).await {
                Ok(admission) if admission.allowed => {}
                Ok(admission) => {
                    info!(
                        "Narration for {} not admitted (subject {}, resets in {:?})",
                        key, subject, admission.retry_after
                    );
                    return None;
                }
                Err(e) => {
                    // Counters unreachable: admit rather than refuse narration.
                    warn!("Admission check failed for subject {}: {}", subject, e);
                }
            }
        }

        let (bytes, content_type) = match &payload {
            NarrationPayload::Speech { text } => {
                let voice = self.voices.profile(tier);
                match self.speech.synthesize(text, voice).await {
                    Ok(audio) => (audio, self.speech.content_type().to_string()),
                    Err(e) => {
                        warn!("Speech synthesis failed for {}: {}", key, e);
                        return None;
                    }
                }
            }
            NarrationPayload::Answer { preamble, messages } => {
                match self.answers.complete(preamble, messages).await {
                    Ok(text) => (
                        Bytes::from(text.into_bytes()),
                        "text/plain; charset=utf-8".to_string(),
                    ),
                    Err(e) => {
                        warn!("Answer generation failed for {}: {}", key, e);
                        return None;
                    }
                }
            }
        };

        let size = bytes.len();
        let artifact = match self.blobs.store(bytes, &content_type).await {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("Failed to store artifact for {}: {}", key, e);
                return None;
            }
        };

        let entry = CacheEntry::new(key, tier, artifact.clone(), &content_type, size);
        if let Err(e) = self.cache.insert(entry).await {
            error!("Failed to record narration {}: {}", key, e);
            return None;
        }

        info!(
            "Generated narration for {} ({} bytes, tier {})",
            key, size, tier
        );
        Some(artifact)
    }

    /// Pure cache probe: never generates, never consumes admission budget.
    pub async fn lookup(&self, key: &str) -> Option<ArtifactRef> {
        match self.cache.lookup(key).await {
            Ok(Some(entry)) => Some(entry.artifact),
            Ok(None) => None,
            Err(e) => {
                warn!("Narration lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Public URL for an artifact.
    pub fn resolve_url(&self, artifact: &ArtifactRef) -> String {
        self.blobs.resolve_url(artifact)
    }
}
