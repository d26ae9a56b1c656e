use super::ServiceConfig;
use super::{merge, validation};

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - Environment variables are malformed
    /// - Configuration validation fails
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge::merge_config(None)?;

        validation::validate_text_limits(config.max_text_len, config.safe_truncate_len)?;
        validation::validate_admission_limits(&config)?;

        Ok(config)
    }
}
