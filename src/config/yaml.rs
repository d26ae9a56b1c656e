use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Environment variables can
/// override any values specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   public_base_url: "https://atlas.example.com"
///
/// providers:
///   speech_api_key: "your-elevenlabs-key"
///   speech_base_url: "https://api.elevenlabs.io/v1/text-to-speech"
///   speech_model: "eleven_v3"
///   speech_output_format: "mp3_44100_128"
///   answer_api_key: "your-openai-key"
///   answer_base_url: "https://api.openai.com/v1"
///   answer_model: "gpt-4o-mini"
///   answer_max_tokens: 512
///   request_timeout_seconds: 30
///
/// narration:
///   max_text_len: 5000
///   safe_truncate_len: 4500
///   retry_max_retries: 2
///   retry_base_delay_ms: 1000
///
/// limits:
///   answers_per_minute: 5
///   answers_per_hour: 30
///   answers_per_day: 100
///   speech_per_minute: 10
///   speech_per_hour: 50
///
/// voices:
///   narrator:
///     voice_id: "21m00Tcm4TlvDq8ikWAM"
///     stability: 0.7
///     speed: 0.95
///   appraiser:
///     voice_id: "21m00Tcm4TlvDq8ikWAM"
///     style: 0.2
///   chat:
///     voice_id: "21m00Tcm4TlvDq8ikWAM"
///
/// storage:
///   data_path: "/var/lib/cicerone"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub narration: Option<NarrationYaml>,
    pub limits: Option<LimitsYaml>,
    pub voices: Option<VoicesYaml>,
    pub storage: Option<StorageYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_base_url: Option<String>,
}

/// Provider configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub speech_api_key: Option<String>,
    pub speech_base_url: Option<String>,
    pub speech_model: Option<String>,
    pub speech_output_format: Option<String>,
    pub answer_api_key: Option<String>,
    pub answer_base_url: Option<String>,
    pub answer_model: Option<String>,
    pub answer_max_tokens: Option<u32>,
    pub request_timeout_seconds: Option<u64>,
}

/// Narration text limits and retry behavior from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NarrationYaml {
    pub max_text_len: Option<usize>,
    pub safe_truncate_len: Option<usize>,
    pub retry_max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
}

/// Admission limits from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LimitsYaml {
    pub answers_per_minute: Option<u32>,
    pub answers_per_hour: Option<u32>,
    pub answers_per_day: Option<u32>,
    pub speech_per_minute: Option<u32>,
    pub speech_per_hour: Option<u32>,
}

/// Per-tier voice profiles from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoicesYaml {
    pub narrator: Option<VoiceYaml>,
    pub appraiser: Option<VoiceYaml>,
    pub chat: Option<VoiceYaml>,
}

/// A single voice profile from YAML
///
/// Unset settings fall back to the built-in profile for the tier.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoiceYaml {
    pub voice_id: Option<String>,
    pub stability: Option<f32>,
    pub similarity_boost: Option<f32>,
    pub style: Option<f32>,
    pub use_speaker_boost: Option<bool>,
    pub speed: Option<f32>,
}

/// Storage configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub data_path: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<YamlConfig, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
