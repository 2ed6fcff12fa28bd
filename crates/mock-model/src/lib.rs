//! Mock chat model implementations for testing turn processing.
//!
//! This crate provides test doubles for the `ChatModel` trait:
//! - `EchoModel` - Echoes request content back
//! - `ScriptedModel` - Replays a fixed sequence of replies and errors
//!
//! For production AI processing, use the `gemini-brain` or
//! `openai-brain` crates instead.
//!
//! # Example
//!
//! ```rust
//! use mock_model::{ChatModel, EchoModel};
//! use chat_core::ModelRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_core::ProviderError> {
//!     let model = EchoModel::new();
//!     let reply = model.generate(&ModelRequest::new("", "Hello!")).await?;
//!     println!("Reply: {}", reply.text);
//!     Ok(())
//! }
//! ```

mod echo;
mod scripted;

// Re-export chat-core types for convenience
pub use chat_core::{ChatModel, ModelRequest, ProviderError, ProviderReply};

pub use echo::EchoModel;
pub use scripted::ScriptedModel;
