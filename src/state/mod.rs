use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::core::CoreState;
use crate::core::narration::NarrationService;
use crate::core::playback::PlaybackCoordinator;
use crate::core::store::BlobStore;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    /// Core layer state that holds the narration pipeline and stores
    pub core_state: Arc<CoreState>,
}

impl AppState {
    pub async fn new(config: ServiceConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let core_state = CoreState::new(&config).await?;

        Ok(Arc::new(Self { config, core_state }))
    }

    /// Get the narration dispatcher
    pub fn narration(&self) -> Arc<NarrationService> {
        self.core_state.narration.clone()
    }

    /// Get a handle to the blob store
    pub fn blobs(&self) -> Arc<dyn BlobStore> {
        self.core_state.blobs.clone()
    }

    /// Get the playback coordinator
    pub fn playback(&self) -> Arc<PlaybackCoordinator> {
        self.core_state.playback.clone()
    }
}
