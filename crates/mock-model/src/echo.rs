//! Echo model implementation - echoes the request content back.

use async_trait::async_trait;

use chat_core::{ChatModel, ModelRequest, ProviderError, ProviderReply};

/// A simple model that echoes the request content back.
///
/// Useful for testing the turn flow without any AI processing.
#[derive(Debug, Clone, Default)]
pub struct EchoModel {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoModel {
    /// Create a new EchoModel with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoModel with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_model::EchoModel;
    ///
    /// let model = EchoModel::with_prefix("Echo: ");
    /// // Will respond with "Echo: <original content>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ProviderReply, ProviderError> {
        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, request.content),
            None => request.content.clone(),
        };
        Ok(ProviderReply::text_only(text))
    }

    fn name(&self) -> &str {
        "EchoModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let model = EchoModel::new();
        let request = ModelRequest::new("", "Hello!");

        let reply = model.generate(&request).await.unwrap();
        assert_eq!(reply.text, "Hello!");
        assert!(!reply.has_tool_calls());
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let model = EchoModel::with_prefix("Echo: ");
        let request = ModelRequest::new("", "Hello!");

        let reply = model.generate(&request).await.unwrap();
        assert_eq!(reply.text, "Echo: Hello!");
    }

    #[tokio::test]
    async fn test_model_name() {
        assert_eq!(EchoModel::new().name(), "EchoModel");
    }
}
