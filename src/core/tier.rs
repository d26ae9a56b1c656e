use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Narration tier
///
/// Every piece of narrated content belongs to exactly one tier. The tier
/// selects the voice profile used for synthesis and decides whether a
/// generation request goes through admission control: narrator content is
/// seeded ahead of time and never rate-limited, the other two tiers are
/// generated on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Pre-generated guided-tour narration
    Narrator,
    /// On-demand commentary for inspected zones
    Appraiser,
    /// Spoken conversational answers
    Chat,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Narrator => "narrator",
            Tier::Appraiser => "appraiser",
            Tier::Chat => "chat",
        }
    }

    /// Whether generation for this tier bypasses admission control
    pub fn skips_admission(&self) -> bool {
        matches!(self, Tier::Narrator)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "narrator" => Ok(Tier::Narrator),
            "appraiser" => Ok(Tier::Appraiser),
            "chat" => Ok(Tier::Chat),
            other => Err(format!("Unknown tier: {other}")),
        }
    }
}

/// Voice settings sent to the speech provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice stability (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    /// Similarity boost (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    /// Style strength (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,
    /// Use speaker boost
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
    /// Speaking rate (0.25 to 4.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: Some(0.5),
            similarity_boost: Some(0.8),
            style: Some(0.0),
            use_speaker_boost: Some(false),
            speed: Some(1.0),
        }
    }
}

/// Voice identity plus settings for a single tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub voice_id: String,
    #[serde(flatten)]
    pub settings: VoiceSettings,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            settings: VoiceSettings::default(),
        }
    }
}

/// Per-tier voice profiles
///
/// The narrator reads slowly and evenly; the appraiser is allowed a bit more
/// expressiveness; chat keeps the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierVoices {
    pub narrator: VoiceProfile,
    pub appraiser: VoiceProfile,
    pub chat: VoiceProfile,
}

impl TierVoices {
    pub fn profile(&self, tier: Tier) -> &VoiceProfile {
        match tier {
            Tier::Narrator => &self.narrator,
            Tier::Appraiser => &self.appraiser,
            Tier::Chat => &self.chat,
        }
    }
}

impl Default for TierVoices {
    fn default() -> Self {
        Self {
            narrator: VoiceProfile {
                voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
                settings: VoiceSettings {
                    stability: Some(0.7),
                    speed: Some(0.95),
                    ..VoiceSettings::default()
                },
            },
            appraiser: VoiceProfile {
                voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
                settings: VoiceSettings {
                    style: Some(0.2),
                    ..VoiceSettings::default()
                },
            },
            chat: VoiceProfile::default(),
        }
    }
}
