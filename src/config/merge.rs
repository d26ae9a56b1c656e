use std::env;
use std::path::PathBuf;

use super::ServiceConfig;
use super::yaml::{VoiceYaml, YamlConfig};
use crate::core::tier::{TierVoices, VoiceProfile, VoiceSettings};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. Environment variables
/// 2. YAML configuration values
/// 3. Default values
///
/// This allows YAML to provide base configuration for a deployment while
/// environment variables override specific values per instance.
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to merge under the environment
///
/// # Returns
/// * `Result<ServiceConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: ENV > YAML > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            env::var($env_var)
                .ok()
                .or($yaml_value)
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: ENV > YAML
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            env::var($env_var).ok().or($yaml_value)
        };
    }

    // Helper macro for parsed numeric values: ENV > YAML > Default.
    // A malformed environment variable is an error, not a silent fallback.
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr, $ty:ty) => {
            if let Ok(raw) = env::var($env_var) {
                raw.parse::<$ty>()
                    .map_err(|e| format!("Invalid {} environment variable: {e}", $env_var))?
            } else if let Some(value) = $yaml_value {
                value
            } else {
                $default
            }
        };
    }

    // Server configuration
    let host = get_value!(
        "HOST",
        yaml.server.as_ref().and_then(|s| s.host.clone()),
        "0.0.0.0"
    );

    let port = get_parsed!(
        "PORT",
        yaml.server.as_ref().and_then(|s| s.port),
        3001,
        u16
    );

    let public_base_url = get_value!(
        "PUBLIC_BASE_URL",
        yaml.server.as_ref().and_then(|s| s.public_base_url.clone()),
        format!("http://localhost:{port}")
    );

    // Speech provider
    let speech_api_key = get_optional!(
        "SPEECH_API_KEY",
        yaml.providers
            .as_ref()
            .and_then(|p| p.speech_api_key.clone())
    );

    let speech_base_url = get_value!(
        "SPEECH_BASE_URL",
        yaml.providers
            .as_ref()
            .and_then(|p| p.speech_base_url.clone()),
        "https://api.elevenlabs.io/v1/text-to-speech"
    );

    let speech_model = get_value!(
        "SPEECH_MODEL",
        yaml.providers.as_ref().and_then(|p| p.speech_model.clone()),
        "eleven_v3"
    );

    let speech_output_format = get_value!(
        "SPEECH_OUTPUT_FORMAT",
        yaml.providers
            .as_ref()
            .and_then(|p| p.speech_output_format.clone()),
        "mp3_44100_128"
    );

    // Answer provider
    let answer_api_key = get_optional!(
        "ANSWER_API_KEY",
        yaml.providers
            .as_ref()
            .and_then(|p| p.answer_api_key.clone())
    );

    let answer_base_url = get_value!(
        "ANSWER_BASE_URL",
        yaml.providers
            .as_ref()
            .and_then(|p| p.answer_base_url.clone()),
        "https://api.openai.com/v1"
    );

    let answer_model = get_value!(
        "ANSWER_MODEL",
        yaml.providers.as_ref().and_then(|p| p.answer_model.clone()),
        "gpt-4o-mini"
    );

    let answer_max_tokens = get_parsed!(
        "ANSWER_MAX_TOKENS",
        yaml.providers.as_ref().and_then(|p| p.answer_max_tokens),
        512,
        u32
    );

    // Outbound request behavior
    let request_timeout_seconds = get_parsed!(
        "REQUEST_TIMEOUT_SECONDS",
        yaml.providers
            .as_ref()
            .and_then(|p| p.request_timeout_seconds),
        30,
        u64
    );

    let retry_max_retries = get_parsed!(
        "RETRY_MAX_RETRIES",
        yaml.narration.as_ref().and_then(|n| n.retry_max_retries),
        2,
        u32
    );

    let retry_base_delay_ms = get_parsed!(
        "RETRY_BASE_DELAY_MS",
        yaml.narration.as_ref().and_then(|n| n.retry_base_delay_ms),
        1000,
        u64
    );

    // Narration text limits
    let max_text_len = get_parsed!(
        "MAX_TEXT_LEN",
        yaml.narration.as_ref().and_then(|n| n.max_text_len),
        5000,
        usize
    );

    let safe_truncate_len = get_parsed!(
        "SAFE_TRUNCATE_LEN",
        yaml.narration.as_ref().and_then(|n| n.safe_truncate_len),
        4500,
        usize
    );

    // Admission limits
    let answers_per_minute = get_parsed!(
        "ANSWERS_PER_MINUTE",
        yaml.limits.as_ref().and_then(|l| l.answers_per_minute),
        5,
        u32
    );

    let answers_per_hour = get_parsed!(
        "ANSWERS_PER_HOUR",
        yaml.limits.as_ref().and_then(|l| l.answers_per_hour),
        30,
        u32
    );

    let answers_per_day = get_parsed!(
        "ANSWERS_PER_DAY",
        yaml.limits.as_ref().and_then(|l| l.answers_per_day),
        100,
        u32
    );

    let speech_per_minute = get_parsed!(
        "SPEECH_PER_MINUTE",
        yaml.limits.as_ref().and_then(|l| l.speech_per_minute),
        10,
        u32
    );

    let speech_per_hour = get_parsed!(
        "SPEECH_PER_HOUR",
        yaml.limits.as_ref().and_then(|l| l.speech_per_hour),
        50,
        u32
    );

    // Voice profiles
    let defaults = TierVoices::default();
    let voices_yaml = yaml.voices.as_ref();
    let voices = TierVoices {
        narrator: merge_voice(
            "NARRATOR_VOICE_ID",
            voices_yaml.and_then(|v| v.narrator.as_ref()),
            defaults.narrator,
        ),
        appraiser: merge_voice(
            "APPRAISER_VOICE_ID",
            voices_yaml.and_then(|v| v.appraiser.as_ref()),
            defaults.appraiser,
        ),
        chat: merge_voice(
            "CHAT_VOICE_ID",
            voices_yaml.and_then(|v| v.chat.as_ref()),
            defaults.chat,
        ),
    };

    // Storage
    let data_path = get_optional!(
        "DATA_PATH",
        yaml.storage.as_ref().and_then(|s| s.data_path.clone())
    )
    .map(PathBuf::from);

    Ok(ServiceConfig {
        host,
        port,
        public_base_url,
        speech_api_key,
        speech_base_url,
        speech_model,
        speech_output_format,
        answer_api_key,
        answer_base_url,
        answer_model,
        answer_max_tokens,
        request_timeout_seconds,
        retry_max_retries,
        retry_base_delay_ms,
        max_text_len,
        safe_truncate_len,
        answers_per_minute,
        answers_per_hour,
        answers_per_day,
        speech_per_minute,
        speech_per_hour,
        voices,
        data_path,
    })
}

/// Build one tier's voice profile from ENV > YAML > the built-in default.
///
/// Only the voice id has an environment override; the finer settings come
/// from YAML or fall back to the default profile for the tier.
fn merge_voice(env_var: &str, yaml: Option<&VoiceYaml>, default: VoiceProfile) -> VoiceProfile {
    let voice_id = env::var(env_var)
        .ok()
        .or_else(|| yaml.and_then(|v| v.voice_id.clone()))
        .unwrap_or(default.voice_id);

    let settings = VoiceSettings {
        stability: yaml.and_then(|v| v.stability).or(default.settings.stability),
        similarity_boost: yaml
            .and_then(|v| v.similarity_boost)
            .or(default.settings.similarity_boost),
        style: yaml.and_then(|v| v.style).or(default.settings.style),
        use_speaker_boost: yaml
            .and_then(|v| v.use_speaker_boost)
            .or(default.settings.use_speaker_boost),
        speed: yaml.and_then(|v| v.speed).or(default.settings.speed),
    };

    VoiceProfile { voice_id, settings }
}
