//! Audio output abstraction.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by an audio backend.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Failed to load audio stream: {0}")]
    Load(String),

    #[error("Audio output unavailable: {0}")]
    Output(String),
}

/// Result type for audio output operations.
pub type PlaybackResult<T> = std::result::Result<T, PlaybackError>;

/// A platform audio backend driven by the playback coordinator.
///
/// Implementations hold at most one stream. `load` replaces whatever stream
/// is current, and `wait_until_ended` resolves when that stream finishes on
/// its own (not when it is stopped or replaced).
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Prepares the stream at `url` for playback, replacing the current one.
    async fn load(&self, url: &str) -> PlaybackResult<()>;

    /// Starts the loaded stream from the beginning.
    async fn play(&self) -> PlaybackResult<()>;

    /// Pauses the current stream, keeping its position.
    async fn pause(&self) -> PlaybackResult<()>;

    /// Resumes a paused stream.
    async fn resume(&self) -> PlaybackResult<()>;

    /// Stops and discards the current stream.
    async fn stop(&self) -> PlaybackResult<()>;

    /// Performs the platform's one-time autoplay unlock.
    ///
    /// Some platforms refuse to emit sound until audio is enabled from a
    /// user gesture. Called at most once per successful unlock.
    async fn unlock(&self) -> PlaybackResult<()>;

    /// Resolves when the current stream plays to its natural end.
    async fn wait_until_ended(&self);
}

/// An output that swallows everything.
///
/// Used by headless hosts that coordinate playback state without an audio
/// device, and as a safe default when no backend is wired up.
pub struct NullOutput;

#[async_trait]
impl AudioOutput for NullOutput {
    async fn load(&self, _url: &str) -> PlaybackResult<()> {
        Ok(())
    }

    async fn play(&self) -> PlaybackResult<()> {
        Ok(())
    }

    async fn pause(&self) -> PlaybackResult<()> {
        Ok(())
    }

    async fn resume(&self) -> PlaybackResult<()> {
        Ok(())
    }

    async fn stop(&self) -> PlaybackResult<()> {
        Ok(())
    }

    async fn unlock(&self) -> PlaybackResult<()> {
        Ok(())
    }

    // A null stream never ends on its own.
    async fn wait_until_ended(&self) {
        std::future::pending::<()>().await
    }
}
