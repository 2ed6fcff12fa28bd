//! Configuration for the alternate provider clients.

use std::env;

use chat_core::ProviderError;

/// Which alternate provider a model hint resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltProvider {
    Groq,
    OpenAi,
    Kimi,
    Claude,
}

impl AltProvider {
    /// Resolve a model hint to a provider.
    ///
    /// Hints beginning with "gemini" belong to the default provider and
    /// resolve to `None`, as do hints matching no known provider.
    pub fn from_model_hint(hint: &str) -> Option<Self> {
        let hint = hint.to_lowercase();
        if hint.starts_with("gemini") {
            return None;
        }
        if hint.contains("groq") || hint.contains("llama") {
            Some(Self::Groq)
        } else if hint.contains("openai") || hint.contains("gpt") {
            Some(Self::OpenAi)
        } else if hint.contains("kimi") || hint.contains("moonshot") {
            Some(Self::Kimi)
        } else if hint.contains("claude") {
            Some(Self::Claude)
        } else {
            None
        }
    }

    /// The concrete model name sent upstream for a given hint.
    pub fn model_for_hint(&self, hint: &str) -> String {
        match self {
            Self::Groq => "llama-3.3-70b-versatile".to_string(),
            Self::OpenAi => "gpt-4o".to_string(),
            Self::Kimi => {
                if hint.to_lowercase().contains("k1.5") {
                    "moonshot-v1-32k".to_string()
                } else {
                    "moonshot-v1-8k".to_string()
                }
            }
            Self::Claude => "claude-3-5-sonnet-20241022".to_string(),
        }
    }

    /// Human-readable provider name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Kimi => "kimi",
            Self::Claude => "claude",
        }
    }
}

/// Configuration for one alternate provider endpoint.
#[derive(Debug, Clone)]
pub struct AltProviderConfig {
    /// Which provider this config addresses.
    pub provider: AltProvider,

    /// API base URL (the client appends /chat/completions).
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl AltProviderConfig {
    /// Create configuration for a provider from environment variables.
    ///
    /// Each provider reads its own key and optional base URL:
    /// - Groq: `GROQ_API_KEY`, `GROQ_API_URL`
    /// - OpenAI: `OPENAI_API_KEY`, `OPENAI_API_URL`
    /// - Kimi: `KIMI_API_KEY`, `KIMI_API_URL`
    /// - Claude: `CLAUDE_API_KEY`, `CLAUDE_API_URL`
    pub fn from_env(provider: AltProvider) -> Result<Self, ProviderError> {
        let (key_var, url_var, default_url) = match provider {
            AltProvider::Groq => (
                "GROQ_API_KEY",
                "GROQ_API_URL",
                "https://api.groq.com/openai/v1",
            ),
            AltProvider::OpenAi => ("OPENAI_API_KEY", "OPENAI_API_URL", "https://api.openai.com/v1"),
            AltProvider::Kimi => ("KIMI_API_KEY", "KIMI_API_URL", "https://api.moonshot.cn/v1"),
            AltProvider::Claude => (
                "CLAUDE_API_KEY",
                "CLAUDE_API_URL",
                "https://api.anthropic.com/v1",
            ),
        };

        let api_key = env::var(key_var)
            .map_err(|_| ProviderError::Config(format!("{key_var} not set")))?;
        let api_url = env::var(url_var).unwrap_or_else(|_| default_url.to_string());

        Ok(Self {
            provider,
            api_url,
            api_key,
            max_tokens: Some(2048),
            temperature: Some(0.7),
            timeout_secs: 60,
        })
    }

    /// Create a config with an explicit key and the provider's default URL.
    pub fn with_key(provider: AltProvider, api_key: impl Into<String>) -> Self {
        let default_url = match provider {
            AltProvider::Groq => "https://api.groq.com/openai/v1",
            AltProvider::OpenAi => "https://api.openai.com/v1",
            AltProvider::Kimi => "https://api.moonshot.cn/v1",
            AltProvider::Claude => "https://api.anthropic.com/v1",
        };
        Self {
            provider,
            api_url: default_url.to_string(),
            api_key: api_key.into(),
            max_tokens: Some(2048),
            temperature: Some(0.7),
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_resolution() {
        assert_eq!(AltProvider::from_model_hint("gemini-2.0-flash"), None);
        assert_eq!(AltProvider::from_model_hint("gemini-pro"), None);
        assert_eq!(
            AltProvider::from_model_hint("groq-llama"),
            Some(AltProvider::Groq)
        );
        assert_eq!(
            AltProvider::from_model_hint("openai-gpt-4o"),
            Some(AltProvider::OpenAi)
        );
        assert_eq!(
            AltProvider::from_model_hint("kimi-k1.5"),
            Some(AltProvider::Kimi)
        );
        assert_eq!(
            AltProvider::from_model_hint("claude-sonnet"),
            Some(AltProvider::Claude)
        );
        assert_eq!(AltProvider::from_model_hint("mystery-model"), None);
    }

    #[test]
    fn test_kimi_model_variants() {
        let kimi = AltProvider::Kimi;
        assert_eq!(kimi.model_for_hint("kimi-k1.5"), "moonshot-v1-32k");
        assert_eq!(kimi.model_for_hint("kimi"), "moonshot-v1-8k");
    }

    #[test]
    fn test_with_key_defaults() {
        let config = AltProviderConfig::with_key(AltProvider::Groq, "gk-test");
        assert_eq!(config.api_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.api_key, "gk-test");
        assert_eq!(config.timeout_secs, 60);
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        std::env::remove_var("GROQ_API_KEY");
        std::env::remove_var("GROQ_API_URL");

        // Missing key errors out
        let result = AltProviderConfig::from_env(AltProvider::Groq);
        assert!(matches!(result, Err(ProviderError::Config(_))));

        // Key set, default URL used
        std::env::set_var("GROQ_API_KEY", "gk-env");
        let config = AltProviderConfig::from_env(AltProvider::Groq).unwrap();
        assert_eq!(config.api_key, "gk-env");
        assert_eq!(config.api_url, "https://api.groq.com/openai/v1");

        // Custom URL override
        std::env::set_var("GROQ_API_URL", "https://proxy.internal/v1");
        let config = AltProviderConfig::from_env(AltProvider::Groq).unwrap();
        assert_eq!(config.api_url, "https://proxy.internal/v1");

        std::env::remove_var("GROQ_API_KEY");
        std::env::remove_var("GROQ_API_URL");
    }
}
