use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ServiceConfig;
use crate::core::cache::NarrationCache;
use crate::core::limiter::{FixedWindowLimiter, WindowLimit};
use crate::core::narration::NarrationService;
use crate::core::playback::{NullOutput, PlaybackCoordinator};
use crate::core::provider::{AnswerClient, AnswerConfig, RetryPolicy, SpeechClient, SpeechConfig};
use crate::core::store::{
    BlobStore, DocumentStore, FsBlobStore, FsDocumentStore, MemoryBlobStore, MemoryDocumentStore,
};

/// Core-specific shared state for the application.
///
/// Owns the narration dispatcher and everything beneath it: the stores, the
/// cache, the admission limiters, and the provider clients. The playback
/// coordinator rides along for hosts that drive audio through this process;
/// the server wires it to a null output.
#[derive(Clone)]
pub struct CoreState {
    /// Narration dispatcher shared by the HTTP handlers and the seeder
    pub narration: Arc<NarrationService>,
    /// Blob store, shared with the artifact handler for direct reads
    pub blobs: Arc<dyn BlobStore>,
    /// Playback coordinator for embedding hosts
    pub playback: Arc<PlaybackCoordinator>,
}

impl CoreState {
    /// Initialize core state from the service configuration.
    ///
    /// With `data_path` set, documents and blobs persist on disk under it and
    /// survive restarts; without it everything stays in memory.
    pub async fn new(config: &ServiceConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let (documents, blobs): (Arc<dyn DocumentStore>, Arc<dyn BlobStore>) =
            match &config.data_path {
                Some(path) => {
                    let documents = FsDocumentStore::new(path.join("documents")).await?;
                    let blobs =
                        FsBlobStore::new(path.join("blobs"), config.public_base_url.clone())
                            .await?;
                    (Arc::new(documents), Arc::new(blobs))
                }
                None => (
                    Arc::new(MemoryDocumentStore::new()),
                    Arc::new(MemoryBlobStore::new(config.public_base_url.clone())),
                ),
            };
        info!(
            "Initialized {} document store and {} blob store",
            documents.backend_type(),
            blobs.backend_type()
        );

        let cache = NarrationCache::new(documents.clone(), 10_000);

        let speech_limiter = FixedWindowLimiter::new(
            "speech",
            vec![
                WindowLimit::per_minute(config.speech_per_minute),
                WindowLimit::per_hour(config.speech_per_hour),
            ],
            documents.clone(),
        );
        let answer_limiter = FixedWindowLimiter::new(
            "answers",
            vec![
                WindowLimit::per_minute(config.answers_per_minute),
                WindowLimit::per_hour(config.answers_per_hour),
                WindowLimit::per_day(config.answers_per_day),
            ],
            documents.clone(),
        );

        let retry = RetryPolicy::new(
            config.retry_max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        );
        let speech = SpeechClient::new(
            SpeechConfig {
                api_key: config.speech_api_key.clone(),
                base_url: config.speech_base_url.clone(),
                model: config.speech_model.clone(),
                output_format: config.speech_output_format.clone(),
                max_text_len: config.max_text_len,
                safe_truncate_len: config.safe_truncate_len,
                request_timeout: Duration::from_secs(config.request_timeout_seconds),
            },
            retry,
        )?;
        let answers = AnswerClient::new(
            AnswerConfig {
                api_key: config.answer_api_key.clone(),
                base_url: config.answer_base_url.clone(),
                model: config.answer_model.clone(),
                max_tokens: config.answer_max_tokens,
                request_timeout: Duration::from_secs(config.request_timeout_seconds),
            },
            retry,
        )?;

        let narration = Arc::new(NarrationService::new(
            cache,
            blobs.clone(),
            speech,
            answers,
            speech_limiter,
            answer_limiter,
            config.voices.clone(),
        ));

        let prefs_path = config
            .data_path
            .as_ref()
            .map(|path| path.join("player_prefs.json"));
        let playback = Arc::new(
            PlaybackCoordinator::new(Arc::new(NullOutput), blobs.clone(), prefs_path).await,
        );

        Ok(Arc::new(Self {
            narration,
            blobs,
            playback,
        }))
    }
}
