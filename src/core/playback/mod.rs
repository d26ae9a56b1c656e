//! Single-stream playback coordination.
//!
//! The coordinator owns exactly one audio stream at a time, tracks its
//! lifecycle, and enforces the player rules: starting narration preempts
//! whatever is active, muting silences immediately, and nothing is ever
//! queued. The audio device itself sits behind [`AudioOutput`], so hosts
//! plug in whatever backend their platform provides.

pub mod coordinator;
pub mod output;
pub mod prefs;

pub use coordinator::{PlaybackCoordinator, PlaybackState};
pub use output::{AudioOutput, NullOutput, PlaybackError, PlaybackResult};
pub use prefs::PlayerPrefs;
