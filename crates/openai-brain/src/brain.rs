//! Chat-completions client for the alternate providers.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use chat_core::{ChatModel, ModelRequest, ProviderError, ProviderReply, Role};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::{AltProvider, AltProviderConfig};

/// A client for one alternate provider.
///
/// All four upstreams accept the chat-completions shape, so a single
/// client covers them; only base URL, key, and model differ. These
/// providers are text-only: attachments and tool declarations are not
/// forwarded.
pub struct AltBrain {
    client: reqwest::Client,
    config: AltProviderConfig,
}

impl AltBrain {
    /// Create a new client with the given configuration.
    pub fn new(config: AltProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a client for a provider from environment variables.
    pub fn from_env(provider: AltProvider) -> Result<Self, ProviderError> {
        Self::new(AltProviderConfig::from_env(provider)?)
    }

    /// Which provider this client addresses.
    pub fn provider(&self) -> AltProvider {
        self.config.provider
    }

    fn build_messages(&self, request: &ModelRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);

        if !request.system_instruction.is_empty() {
            messages.push(ChatMessage::system(&request.system_instruction));
        }

        for msg in &request.history {
            match msg.role {
                Role::Model => messages.push(ChatMessage::assistant(&msg.content)),
                Role::User => messages.push(ChatMessage::user(&msg.content)),
                Role::System => messages.push(ChatMessage::system(&msg.content)),
            }
        }

        messages.push(ChatMessage::user(&request.content));
        messages
    }
}

#[async_trait]
impl ChatModel for AltBrain {
    async fn generate(&self, request: &ModelRequest) -> Result<ProviderReply, ProviderError> {
        let hint = request.model.as_deref().unwrap_or_default();
        let model = self.config.provider.model_for_hint(hint);
        let url = format!("{}/chat/completions", self.config.api_url);

        let body = ChatCompletionRequest {
            model: model.clone(),
            messages: self.build_messages(request),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(provider = self.name(), model, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());

            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);

            if status.as_u16() == 429 {
                warn!(provider = self.name(), "provider rate limited");
                return Err(ProviderError::RateLimited(message));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to decode response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".to_string()))?;

        if let Some(usage) = completion.usage {
            debug!(
                provider = self.name(),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion finished"
            );
        }

        Ok(ProviderReply::text_only(
            choice.message.content.unwrap_or_default(),
        ))
    }

    fn name(&self) -> &str {
        self.config.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::HistoryMessage;

    fn test_brain(provider: AltProvider) -> AltBrain {
        AltBrain::new(AltProviderConfig::with_key(provider, "test-key")).unwrap()
    }

    #[test]
    fn test_model_history_becomes_assistant() {
        let brain = test_brain(AltProvider::Groq);
        let request = ModelRequest {
            system_instruction: "be helpful".to_string(),
            history: vec![
                HistoryMessage::user("hello"),
                HistoryMessage::model("hi there"),
            ],
            content: "follow up".to_string(),
            ..ModelRequest::default()
        };

        let messages = brain.build_messages(&request);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[2].content, "hi there");
        assert_eq!(messages[3].role, "user");
    }

    #[test]
    fn test_empty_instruction_omitted() {
        let brain = test_brain(AltProvider::OpenAi);
        let request = ModelRequest {
            content: "hello".to_string(),
            ..ModelRequest::default()
        };

        let messages = brain.build_messages(&request);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(test_brain(AltProvider::Groq).name(), "groq");
        assert_eq!(test_brain(AltProvider::Kimi).name(), "kimi");
        assert_eq!(test_brain(AltProvider::Claude).name(), "claude");
    }
}
