pub mod cache;
pub mod limiter;
pub mod narration;
pub mod playback;
pub mod provider;
pub mod state;
pub mod store;
pub mod tier;

// Re-export commonly used types for convenience
pub use cache::{CacheEntry, NarrationCache};
pub use limiter::{Admission, FixedWindowLimiter, WindowLimit};
pub use narration::{NarrationPayload, NarrationService};
pub use playback::{AudioOutput, PlaybackCoordinator, PlaybackError, PlaybackState};
pub use provider::{
    AnswerClient, AnswerConfig, ChatMessage, ProviderError, ProviderResult, RetryPolicy,
    SpeechClient, SpeechConfig, with_retry,
};
pub use store::{ArtifactRef, BlobStore, DocumentStore, StoreError, StoreResult, StoredBlob};
pub use tier::{Tier, TierVoices, VoiceProfile, VoiceSettings};

// Re-export CoreState for external use
pub use state::CoreState;
