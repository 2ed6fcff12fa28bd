//! Turn engine for the Sona assistant backend.
//!
//! Coordinates one user turn end to end:
//!
//! 1. Resolve the reply language and conversation [`chat_core::Mode`].
//! 2. Build the system instruction for the resolved mode and persona.
//! 3. Route the generation call through [`ProviderRouter`]: alternates
//!    get one attempt with silent fallback, the default provider gets
//!    rate-limit retries with backoff.
//! 4. Dispatch tool activity on both paths: structured tool calls, and
//!    action JSON recovered from reply text.
//! 5. Assemble a [`FinalResponse`], folding failures into a
//!    client-renderable envelope.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orchestrator::{ChatEngine, EngineConfig, ProviderRouter};
//! use chat_core::TurnRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let default = Arc::new(gemini_brain::GeminiBrain::from_env()?);
//!     let router = Arc::new(ProviderRouter::new(default));
//!     let registry = Arc::new(assistant_tools::ToolRegistry::new());
//!     let engine = ChatEngine::new(router, registry, &EngineConfig::from_env());
//!
//!     let response = engine.process(&TurnRequest::new("hello", "session-1")).await?;
//!     println!("{}", response.reply);
//!     Ok(())
//! }
//! ```

mod actions;
mod assemble;
mod config;
mod dispatch;
mod engine;
mod error;
mod extract;
mod router;

pub use actions::{ToolAction, DEFAULT_AUDIO_DURATION};
pub use assemble::{ConversionFile, FinalResponse};
pub use config::EngineConfig;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use engine::ChatEngine;
pub use error::EngineError;
pub use extract::{
    conversion_reply_text, extract_conversion, extract_legacy_action, strip_action_text,
    ConversionParams, ExtractedAction,
};
pub use router::ProviderRouter;
