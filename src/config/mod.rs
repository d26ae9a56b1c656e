//! Configuration module for the Cicerone server
//!
//! This module handles server configuration from various sources: YAML files and
//! environment variables. Environment variables always override YAML values.
//! The configuration is split into logical submodules for maintainability and extensibility.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use cicerone::config::ServiceConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServiceConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServiceConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::tier::TierVoices;

mod env;
mod merge;
mod validation;
mod yaml;

/// Server configuration
///
/// Contains all configuration needed to run the Cicerone server, including:
/// - Server settings (host, port, public base URL)
/// - Provider settings (speech synthesis, answer generation)
/// - Narration text limits and retry behavior
/// - Admission limits per tier
/// - Voice profiles per tier
/// - Storage location
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Base URL clients use to reach this server, embedded in artifact URLs.
    pub public_base_url: String,

    // Speech provider
    pub speech_api_key: Option<String>,
    pub speech_base_url: String,
    pub speech_model: String,
    pub speech_output_format: String,

    // Answer provider
    pub answer_api_key: Option<String>,
    pub answer_base_url: String,
    pub answer_model: String,
    pub answer_max_tokens: u32,

    // Outbound request behavior
    pub request_timeout_seconds: u64,
    pub retry_max_retries: u32,
    pub retry_base_delay_ms: u64,

    // Narration text limits (characters)
    pub max_text_len: usize,
    pub safe_truncate_len: usize,

    // Admission limits
    pub answers_per_minute: u32,
    pub answers_per_hour: u32,
    pub answers_per_day: u32,
    pub speech_per_minute: u32,
    pub speech_per_hour: u32,

    // Voice profiles per tier
    pub voices: TierVoices,

    // Storage root (filesystem-backed if set, in-memory otherwise)
    pub data_path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// Loads configuration from the specified YAML file, then applies environment
    /// variable overrides. This allows YAML to provide base configuration while
    /// environment variables can override specific values.
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // Note: We do NOT load .env file here since the user explicitly specified a
        // YAML config file. Only actual environment variables override it.

        // Load YAML configuration
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        // Merge with environment variables
        let config = merge::merge_config(Some(yaml_config))?;

        // Validate configuration
        validation::validate_text_limits(config.max_text_len, config.safe_truncate_len)?;
        validation::validate_admission_limits(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the speech provider is usable
    ///
    /// Returns true if SPEECH_API_KEY is set
    pub fn has_speech_provider(&self) -> bool {
        self.speech_api_key.is_some()
    }

    /// Whether the answer provider is usable
    ///
    /// Returns true if ANSWER_API_KEY is set
    pub fn has_answer_provider(&self) -> bool {
        self.answer_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn base_config() -> ServiceConfig {
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
            answers_per_minute: 5,
            answers_per_hour: 30,
            answers_per_day: 100,
            speech_per_minute: 10,
            speech_per_hour: 50,
            voices: TierVoices::default(),
            data_path: None,
        }
    }

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("PUBLIC_BASE_URL");
            env::remove_var("SPEECH_API_KEY");
            env::remove_var("SPEECH_BASE_URL");
            env::remove_var("SPEECH_MODEL");
            env::remove_var("SPEECH_OUTPUT_FORMAT");
            env::remove_var("ANSWER_API_KEY");
            env::remove_var("ANSWER_BASE_URL");
            env::remove_var("ANSWER_MODEL");
            env::remove_var("ANSWER_MAX_TOKENS");
            env::remove_var("REQUEST_TIMEOUT_SECONDS");
            env::remove_var("RETRY_MAX_RETRIES");
            env::remove_var("RETRY_BASE_DELAY_MS");
            env::remove_var("MAX_TEXT_LEN");
            env::remove_var("SAFE_TRUNCATE_LEN");
            env::remove_var("ANSWERS_PER_MINUTE");
            env::remove_var("ANSWERS_PER_HOUR");
            env::remove_var("ANSWERS_PER_DAY");
            env::remove_var("SPEECH_PER_MINUTE");
            env::remove_var("SPEECH_PER_HOUR");
            env::remove_var("NARRATOR_VOICE_ID");
            env::remove_var("APPRAISER_VOICE_ID");
            env::remove_var("CHAT_VOICE_ID");
            env::remove_var("DATA_PATH");
        }
    }

    #[test]
    fn test_address() {
        let config = base_config();
        assert_eq!(config.address(), "localhost:3001");
    }

    #[test]
    fn test_provider_presence() {
        let config = base_config();
        assert!(!config.has_speech_provider());
        assert!(!config.has_answer_provider());

        let config = ServiceConfig {
            speech_api_key: Some("el-key".to_string()),
            answer_api_key: Some("oa-key".to_string()),
            ..base_config()
        };
        assert!(config.has_speech_provider());
        assert!(config.has_answer_provider());
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
  public_base_url: "https://atlas.example.com"

providers:
  speech_api_key: "yaml-speech-key"
  answer_api_key: "yaml-answer-key"

limits:
  answers_per_minute: 7

storage:
  data_path: "/tmp/yaml-cicerone"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServiceConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_base_url, "https://atlas.example.com");
        assert_eq!(config.speech_api_key, Some("yaml-speech-key".to_string()));
        assert_eq!(config.answer_api_key, Some("yaml-answer-key".to_string()));
        assert_eq!(config.answers_per_minute, 7);
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/yaml-cicerone")));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_env_overrides_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

providers:
  speech_api_key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("SPEECH_API_KEY", "env-key");
        }

        let config = ServiceConfig::from_file(&config_path).unwrap();

        // ENV overrides YAML
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.speech_api_key, Some("env-key".to_string()));
        // YAML value used when no ENV
        assert_eq!(config.port, 8080);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServiceConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServiceConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_partial_config() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  port: 9000

narration:
  max_text_len: 6000
  safe_truncate_len: 5400
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServiceConfig::from_file(&config_path).unwrap();

        // YAML values
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_text_len, 6000);
        assert_eq!(config.safe_truncate_len, 5400);

        // Default values
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.speech_model, "eleven_v3");
        assert_eq!(config.retry_max_retries, 2);
        assert_eq!(config.answers_per_day, 100);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_bad_truncation_limits() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
narration:
  max_text_len: 4000
  safe_truncate_len: 4500
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let result = ServiceConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SAFE_TRUNCATE_LEN"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_voices() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
voices:
  narrator:
    voice_id: "custom-narrator-voice"
    stability: 0.9
  chat:
    voice_id: "custom-chat-voice"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServiceConfig::from_file(&config_path).unwrap();

        assert_eq!(config.voices.narrator.voice_id, "custom-narrator-voice");
        assert_eq!(config.voices.narrator.settings.stability, Some(0.9));
        // Unset settings fall back to the tier default
        assert_eq!(config.voices.narrator.settings.speed, Some(0.95));
        assert_eq!(config.voices.chat.voice_id, "custom-chat-voice");
        // Untouched tier keeps its default profile
        assert_eq!(config.voices.appraiser.voice_id, "21m00Tcm4TlvDq8ikWAM");

        cleanup_env_vars();
    }
}
