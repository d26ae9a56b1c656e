use super::ServiceConfig;

/// Validate narration text limits
///
/// Ensures both limits are non-zero and that the truncation target does not
/// exceed the hard ceiling. A safe length above the maximum would make the
/// truncation guard unreachable.
pub fn validate_text_limits(
    max_text_len: usize,
    safe_truncate_len: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if max_text_len == 0 {
        return Err("MAX_TEXT_LEN must be greater than zero".into());
    }
    if safe_truncate_len == 0 {
        return Err("SAFE_TRUNCATE_LEN must be greater than zero".into());
    }
    if safe_truncate_len > max_text_len {
        return Err(format!(
            "SAFE_TRUNCATE_LEN ({safe_truncate_len}) cannot exceed MAX_TEXT_LEN ({max_text_len})"
        )
        .into());
    }

    Ok(())
}

/// Validate admission limits
///
/// Every configured window must admit at least one request; a zero limit
/// would reject everything forever.
pub fn validate_admission_limits(config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let limits = [
        ("ANSWERS_PER_MINUTE", config.answers_per_minute),
        ("ANSWERS_PER_HOUR", config.answers_per_hour),
        ("ANSWERS_PER_DAY", config.answers_per_day),
        ("SPEECH_PER_MINUTE", config.speech_per_minute),
        ("SPEECH_PER_HOUR", config.speech_per_hour),
    ];

    for (name, value) in limits {
        if value == 0 {
            return Err(format!("{name} must be greater than zero").into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tier::TierVoices;

    fn config_with_limits(answers_per_minute: u32) -> ServiceConfig {
        ServiceConfig {
            host: "localhost".to_string(),
            port: 3001,
            public_base_url: "http://localhost:3001".to_string(),
            speech_api_key: None,
            speech_base_url: "https://api.elevenlabs.io/v1/text-to-speech".to_string(),
            speech_model: "eleven_v3".to_string(),
            speech_output_format: "mp3_44100_128".to_string(),
            answer_api_key: None,
            answer_base_url: "https://api.openai.com/v1".to_string(),
            answer_model: "gpt-4o-mini".to_string(),
            answer_max_tokens: 512,
            request_timeout_seconds: 30,
            retry_max_retries: 2,
            retry_base_delay_ms: 1000,
            max_text_len: 5000,
            safe_truncate_len: 4500,
            answers_per_minute,
            answers_per_hour: 30,
            answers_per_day: 100,
            speech_per_minute: 10,
            speech_per_hour: 50,
            voices: TierVoices::default(),
            data_path: None,
        }
    }

    #[test]
    fn test_text_limits_valid() {
        assert!(validate_text_limits(5000, 4500).is_ok());
        assert!(validate_text_limits(5000, 5000).is_ok());
    }

    #[test]
    fn test_text_limits_zero() {
        assert!(validate_text_limits(0, 4500).is_err());
        assert!(validate_text_limits(5000, 0).is_err());
    }

    #[test]
    fn test_text_limits_safe_above_max() {
        let result = validate_text_limits(4000, 4500);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("cannot exceed MAX_TEXT_LEN")
        );
    }

    #[test]
    fn test_admission_limits_valid() {
        assert!(validate_admission_limits(&config_with_limits(5)).is_ok());
    }

    #[test]
    fn test_admission_limits_zero() {
        let result = validate_admission_limits(&config_with_limits(0));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("ANSWERS_PER_MINUTE must be greater than zero")
        );
    }
}
