//! Default provider client for the Sona assistant backend.
//!
//! Speaks the generateContent protocol: camelCase wire types, inline
//! attachment data, native function calling via tool declarations, and
//! quota errors surfaced as [`chat_core::ProviderError::RateLimited`].

pub mod api_types;
pub mod brain;
pub mod config;
pub mod tools;

pub use brain::GeminiBrain;
pub use config::{GeminiConfig, GeminiConfigBuilder};
pub use tools::tool_declarations;
