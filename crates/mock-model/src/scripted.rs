//! Scripted model implementation - replays a fixed sequence of outcomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use chat_core::{ChatModel, ModelRequest, ProviderError, ProviderReply};

/// A model that replays a queued sequence of replies and errors.
///
/// Each call to `generate` pops the next outcome. Once the script is
/// exhausted, further calls return an `InvalidResponse` error. Useful
/// for driving retry and fallback paths deterministically.
pub struct ScriptedModel {
    name: String,
    script: Mutex<VecDeque<Result<ProviderReply, ProviderError>>>,
    calls: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    /// Create a scripted model with the given outcomes, oldest first.
    pub fn new(script: Vec<Result<ProviderReply, ProviderError>>) -> Self {
        Self {
            name: "ScriptedModel".to_string(),
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a scripted model with a custom name for logging assertions.
    pub fn named(name: impl Into<String>, script: Vec<Result<ProviderReply, ProviderError>>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// How many times `generate` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The requests seen so far, in call order.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ProviderReply, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
