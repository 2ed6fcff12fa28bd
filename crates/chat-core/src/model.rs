//! The ChatModel trait and provider request/reply types.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::message::{Attachment, HistoryMessage};

/// One structured tool call requested by a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool function name (e.g. "generate_image").
    pub name: String,
    /// Arguments as key-value pairs.
    pub args: HashMap<String, Value>,
}

impl ToolCall {
    /// Create a tool call.
    pub fn new(name: impl Into<String>, args: HashMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Get a string argument.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }

    /// Get a numeric argument.
    pub fn arg_f64(&self, key: &str) -> Option<f64> {
        self.args.get(key).and_then(|v| v.as_f64())
    }

    /// Get a boolean argument.
    pub fn arg_bool(&self, key: &str) -> Option<bool> {
        self.args.get(key).and_then(|v| v.as_bool())
    }
}

/// A provider's reply to one generation call.
#[derive(Debug, Clone, Default)]
pub struct ProviderReply {
    /// Text content, possibly empty when only tool calls were returned.
    pub text: String,
    /// Structured tool calls, in response order.
    pub tool_calls: Vec<ToolCall>,
}

impl ProviderReply {
    /// A reply carrying only text.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Whether the provider requested any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// One generation request toward a provider.
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    /// Final system instruction for this turn.
    pub system_instruction: String,
    /// Prior conversation, oldest first.
    pub history: Vec<HistoryMessage>,
    /// The current user message.
    pub content: String,
    /// Attachments on the current message.
    pub attachments: Vec<Attachment>,
    /// Model identifier override; providers fall back to their configured
    /// default when absent.
    pub model: Option<String>,
    /// Whether tool declarations are sent with this call.
    pub enable_tools: bool,
}

impl ModelRequest {
    /// A minimal request: instruction + user content, tools enabled.
    pub fn new(system_instruction: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            content: content.into(),
            enable_tools: true,
            ..Self::default()
        }
    }

    /// A short follow-up completion with no history, attachments, or tools.
    ///
    /// Used for confirmation narration after a tool side effect.
    pub fn follow_up(system_instruction: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            content: content.into(),
            enable_tools: false,
            ..Self::default()
        }
    }
}

/// A chat model backend.
///
/// Implementations range from HTTP provider clients to scripted test
/// doubles. This trait is object-safe and used with `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one generation call.
    async fn generate(&self, request: &ModelRequest) -> Result<ProviderReply, ProviderError>;

    /// Human-readable provider name for logging.
    fn name(&self) -> &str;
}
