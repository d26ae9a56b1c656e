//! Playback coordinator.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::output::AudioOutput;
use super::prefs::PlayerPrefs;
use crate::core::store::{ArtifactRef, BlobStore};
use crate::core::tier::Tier;

/// Where the player currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamPhase {
    Loading,
    Playing,
    Paused,
}

struct Session {
    key: String,
    tier: Tier,
    phase: StreamPhase,
}

struct StreamState {
    /// `None` is Idle.
    session: Option<Session>,
    /// Cancelled whenever the session is preempted or stopped, so in-flight
    /// loads and end-of-stream watchers know they no longer own the output.
    token: CancellationToken,
}

/// Coordinates a single narration stream against one audio output.
///
/// There is never a queue: starting narration preempts whatever is active,
/// muting silences immediately, and a stream that ends on its own returns
/// the player to idle. The mute preference persists across sessions when a
/// prefs path is configured.
pub struct PlaybackCoordinator {
    output: Arc<dyn AudioOutput>,
    resolver: Arc<dyn BlobStore>,
    stream: Arc<Mutex<StreamState>>,
    muted: AtomicBool,
    unlocked: AtomicBool,
    prefs_path: Option<PathBuf>,
}

impl PlaybackCoordinator {
    pub async fn new(
        output: Arc<dyn AudioOutput>,
        resolver: Arc<dyn BlobStore>,
        prefs_path: Option<PathBuf>,
    ) -> Self {
        let muted = match &prefs_path {
            Some(path) => PlayerPrefs::load(path).await.muted,
            None => false,
        };
        if muted {
            debug!("Player starts muted from saved preference");
        }

        Self {
            output,
            resolver,
            stream: Arc::new(Mutex::new(StreamState {
                session: None,
                token: CancellationToken::new(),
            })),
            muted: AtomicBool::new(muted),
            unlocked: AtomicBool::new(false),
            prefs_path,
        }
    }

    /// Starts playing `artifact`, preempting whatever is active.
    ///
    /// While muted this is a complete no-op: no state change, no loading,
    /// no unlock attempt. A load that gets superseded by a newer `play`
    /// abandons quietly without touching the newer session, and a load that
    /// fails clears the player back to idle.
    pub async fn play(&self, artifact: &ArtifactRef, key: &str, tier: Tier) {
        if self.muted.load(Ordering::SeqCst) {
            debug!("Playback of {} skipped while muted", key);
            return;
        }
        self.unlock_audio().await;

        // Preempt. The old token is cancelled before the new session exists,
        // so a racing watcher always finds it dead.
        let token = {
            let mut stream = self.stream.lock();
            stream.token.cancel();
            stream.token = CancellationToken::new();
            stream.session = Some(Session {
                key: key.to_string(),
                tier,
                phase: StreamPhase::Loading,
            });
            stream.token.clone()
        };
        if let Err(e) = self.output.stop().await {
            debug!("Stopping previous stream failed: {}", e);
        }

        let url = self.resolver.resolve_url(artifact);
        let loaded = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = self.output.load(&url) => result,
        };
        if let Err(e) = loaded {
            warn!("Failed to load {} for {}: {}", url, key, e);
            self.clear_if_current(&token);
            return;
        }

        let started = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = self.output.play() => result,
        };
        if let Err(e) = started {
            warn!("Failed to start playback of {}: {}", key, e);
            self.clear_if_current(&token);
            return;
        }

        {
            let mut stream = self.stream.lock();
            if !token.is_cancelled()
                && let Some(session) = stream.session.as_mut()
            {
                session.phase = StreamPhase::Playing;
            }
        }
        info!("Playing narration {} (tier {})", key, tier);

        // Watch for the stream ending on its own.
        let watcher_output = self.output.clone();
        let watcher_stream = self.stream.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = watcher_output.wait_until_ended() => {
                    let mut stream = watcher_stream.lock();
                    if !token.is_cancelled() {
                        stream.session = None;
                    }
                }
            }
        });
    }

    /// Pauses the current stream. Meaningful only while playing.
    pub async fn pause(&self) {
        let should_pause = {
            let mut stream = self.stream.lock();
            match stream.session.as_mut() {
                Some(session) if session.phase == StreamPhase::Playing => {
                    session.phase = StreamPhase::Paused;
                    true
                }
                _ => false,
            }
        };
        if should_pause && let Err(e) = self.output.pause().await {
            warn!("Pause failed: {}", e);
        }
    }

    /// Resumes a paused stream. No-ops while muted.
    pub async fn resume(&self) {
        if self.muted.load(Ordering::SeqCst) {
            return;
        }
        let should_resume = {
            let mut stream = self.stream.lock();
            match stream.session.as_mut() {
                Some(session) if session.phase == StreamPhase::Paused => {
                    session.phase = StreamPhase::Playing;
                    true
                }
                _ => false,
            }
        };
        if should_resume && let Err(e) = self.output.resume().await {
            warn!("Resume failed: {}", e);
        }
    }

    /// Stops playback unconditionally and returns to idle.
    pub async fn stop(&self) {
        {
            let mut stream = self.stream.lock();
            stream.token.cancel();
            stream.session = None;
        }
        if let Err(e) = self.output.stop().await {
            debug!("Stop failed: {}", e);
        }
    }

    /// Flips the mute preference and returns the new state.
    ///
    /// Muting stops any active stream in the same call; the listener asked
    /// for silence now, not after the current narration. Unmuting never
    /// auto-resumes.
    pub async fn toggle_mute(&self) -> bool {
        let muted = !self.muted.fetch_xor(true, Ordering::SeqCst);
        if muted {
            self.stop().await;
        }
        info!("Narration {}", if muted { "muted" } else { "unmuted" });

        if let Some(path) = &self.prefs_path
            && let Err(e) = (PlayerPrefs { muted }).save(path).await
        {
            warn!("Failed to persist player prefs: {}", e);
        }

        muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Runs the platform's one-time autoplay unlock if it hasn't happened.
    ///
    /// Hosts call this from the first user gesture; `play` also calls it so
    /// gesture-driven playback unlocks on its own. A failed unlock may be
    /// retried on the next gesture.
    pub async fn unlock_audio(&self) {
        if self.unlocked.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.output.unlock().await {
            warn!("Audio unlock failed: {}", e);
            self.unlocked.store(false, Ordering::SeqCst);
        }
    }

    pub fn state(&self) -> PlaybackState {
        let stream = self.stream.lock();
        match &stream.session {
            None => PlaybackState::Idle,
            Some(session) => match session.phase {
                StreamPhase::Loading => PlaybackState::Loading,
                StreamPhase::Playing => PlaybackState::Playing,
                StreamPhase::Paused => PlaybackState::Paused,
            },
        }
    }

    /// Whether `key` is the stream currently playing.
    pub fn is_playing(&self, key: &str) -> bool {
        let stream = self.stream.lock();
        stream
            .session
            .as_ref()
            .is_some_and(|s| s.key == key && s.phase == StreamPhase::Playing)
    }

    /// Whether `key` is the stream currently loading.
    pub fn is_loading(&self, key: &str) -> bool {
        let stream = self.stream.lock();
        stream
            .session
            .as_ref()
            .is_some_and(|s| s.key == key && s.phase == StreamPhase::Loading)
    }

    /// Key of the active stream, if any.
    pub fn current_key(&self) -> Option<String> {
        let stream = self.stream.lock();
        stream.session.as_ref().map(|s| s.key.clone())
    }

    /// Tier of the active stream, if any.
    pub fn current_tier(&self) -> Option<Tier> {
        let stream = self.stream.lock();
        stream.session.as_ref().map(|s| s.tier)
    }

    fn clear_if_current(&self, token: &CancellationToken) {
        let mut stream = self.stream.lock();
        if !token.is_cancelled() {
            stream.session = None;
        }
    }
}
