//! Configuration for GeminiBrain.

use std::env;

use chat_core::ProviderError;

/// Configuration for GeminiBrain.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Default model name.
    pub model: String,

    /// Maximum output tokens per response.
    pub max_output_tokens: Option<u32>,

    /// Generation temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            max_output_tokens: Some(2048),
            temperature: Some(0.7),
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API base URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_MODEL` - Model name (default: gemini-2.0-flash)
    /// - `GEMINI_MAX_OUTPUT_TOKENS` - Max output tokens (default: 2048)
    /// - `GEMINI_TEMPERATURE` - Temperature (default: 0.7)
    /// - `GEMINI_TIMEOUT_SECS` - Request timeout in seconds (default: 60)
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::Config("GEMINI_API_KEY not set".to_string()))?;

        let api_url = env::var("GEMINI_API_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let max_output_tokens = env::var("GEMINI_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(2048));

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.7));

        let timeout_secs = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            api_url,
            api_key,
            model,
            max_output_tokens,
            temperature,
            timeout_secs,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }
}

/// Builder for GeminiConfig.
#[derive(Debug, Default)]
pub struct GeminiConfigBuilder {
    config: GeminiConfig,
}

impl GeminiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max output tokens.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.config.max_output_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();

        assert_eq!(config.api_url, "https://generativelanguage.googleapis.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_output_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_builder_all_options() {
        let config = GeminiConfig::builder()
            .api_key("my-key")
            .api_url("https://custom.api.com")
            .model("gemini-pro")
            .max_output_tokens(512)
            .temperature(0.3)
            .timeout_secs(30)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "https://custom.api.com");
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.max_output_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.timeout_secs, 30);
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_gemini_vars() {
            std::env::remove_var("GEMINI_API_KEY");
            std::env::remove_var("GEMINI_API_URL");
            std::env::remove_var("GEMINI_MODEL");
            std::env::remove_var("GEMINI_MAX_OUTPUT_TOKENS");
            std::env::remove_var("GEMINI_TEMPERATURE");
            std::env::remove_var("GEMINI_TIMEOUT_SECS");
        }

        // Scenario 1: Missing API key should error
        clear_all_gemini_vars();
        let result = GeminiConfig::from_env();
        assert!(matches!(result, Err(ProviderError::Config(_))));

        // Scenario 2: Only API key set, defaults used
        clear_all_gemini_vars();
        std::env::set_var("GEMINI_API_KEY", "test-env-key");

        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-env-key");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_output_tokens, Some(2048));
        assert_eq!(config.timeout_secs, 60);

        // Scenario 3: All vars set
        clear_all_gemini_vars();
        std::env::set_var("GEMINI_API_KEY", "full-test-key");
        std::env::set_var("GEMINI_API_URL", "https://test.api.com");
        std::env::set_var("GEMINI_MODEL", "gemini-pro");
        std::env::set_var("GEMINI_MAX_OUTPUT_TOKENS", "4096");
        std::env::set_var("GEMINI_TEMPERATURE", "0.9");
        std::env::set_var("GEMINI_TIMEOUT_SECS", "120");

        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "full-test-key");
        assert_eq!(config.api_url, "https://test.api.com");
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.max_output_tokens, Some(4096));
        assert_eq!(config.temperature, Some(0.9));
        assert_eq!(config.timeout_secs, 120);

        // Cleanup
        clear_all_gemini_vars();
    }
}
