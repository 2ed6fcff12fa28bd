//! Alternate provider clients for the Sona assistant backend.
//!
//! When a turn carries a non-default model hint, routing sends it here
//! once; any failure falls back to the default provider. Four upstreams
//! are supported through one chat-completions client: Groq, OpenAI,
//! Kimi (Moonshot), and Claude.

pub mod api_types;
pub mod brain;
pub mod config;

pub use brain::AltBrain;
pub use config::{AltProvider, AltProviderConfig};
