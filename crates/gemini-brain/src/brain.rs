//! The Gemini provider client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use chat_core::{ChatModel, ModelRequest, ProviderError, ProviderReply, Role, ToolCall};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::config::GeminiConfig;
use crate::tools::tool_declarations;

/// Default provider client speaking the generateContent protocol.
pub struct GeminiBrain {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiBrain {
    /// Create a new client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(GeminiConfig::from_env()?)
    }

    fn build_body(&self, request: &ModelRequest) -> GenerateContentRequest {
        let mut contents = Vec::with_capacity(request.history.len() + 1);

        for msg in &request.history {
            // System-role history entries are rare but carried as user turns
            // since the protocol only accepts user and model roles here.
            let role = match msg.role {
                Role::Model => "model",
                Role::User | Role::System => "user",
            };
            contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![Part::text(&msg.content)],
            });
        }

        let mut parts = vec![Part::text(&request.content)];
        for att in &request.attachments {
            parts.push(Part::inline(&att.mime_type, &att.data));
        }
        contents.push(Content::user(parts));

        GenerateContentRequest {
            system_instruction: if request.system_instruction.is_empty() {
                None
            } else {
                Some(Content::text(&request.system_instruction))
            },
            contents,
            tools: if request.enable_tools {
                Some(tool_declarations())
            } else {
                None
            },
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            }),
        }
    }

    async fn generate_content(
        &self,
        request: &ModelRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url, model
        );
        let body = self.build_body(request);

        debug!(model, tools = request.enable_tools, "sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
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

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&text) {
                let detail = api_error.error;
                let exhausted = detail.status.as_deref() == Some("RESOURCE_EXHAUSTED");
                if status.as_u16() == 429 || exhausted {
                    warn!(code = detail.code, "provider rate limited");
                    return Err(ProviderError::RateLimited(detail.message));
                }
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: detail.message,
                });
            }

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited(text));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to decode response: {e}")))
    }
}

#[async_trait]
impl ChatModel for GeminiBrain {
    async fn generate(&self, request: &ModelRequest) -> Result<ProviderReply, ProviderError> {
        let response = self.generate_content(request).await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no candidates in response".to_string()))?;

        let mut reply = ProviderReply::default();
        if let Some(content) = candidate.content {
            for part in content.parts {
                if let Some(text) = part.text {
                    if !reply.text.is_empty() {
                        reply.text.push('\n');
                    }
                    reply.text.push_str(&text);
                }
                if let Some(call) = part.function_call {
                    reply.tool_calls.push(ToolCall::new(call.name, call.args));
                }
            }
        }

        if let Some(usage) = response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                completion_tokens = usage.candidates_token_count,
                tool_calls = reply.tool_calls.len(),
                "generation complete"
            );
        }

        Ok(reply)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
