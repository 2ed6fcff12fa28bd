//! Capability tools and registry for the Sona assistant backend.
//!
//! This crate provides a `ToolRegistry` for registering and executing
//! the side-effecting capabilities the assistant can trigger: media
//! generation, web search, reminders, and file conversion. Tools are
//! dispatched from structured provider tool calls, and from action JSON
//! recovered out of reply text on the legacy path.
//!
//! # Built-in Tools
//!
//! - [`GenerateImage`], [`GenerateVideo`], [`GenerateAudio`] - Media
//!   generation via the media capability service.
//! - [`ModifyImage`] - Image editing; the caller supplies the source image.
//! - [`WebSearch`] - Real-time web search with placeholder detection.
//! - [`SetReminder`] - Reminder confirmation; the client app schedules it.
//! - [`FileConversion`] - Document and image format conversion.
//!
//! # Example
//!
//! ```rust,ignore
//! use assistant_tools::{ToolRegistry, SetReminder};
//! use std::collections::HashMap;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut registry = ToolRegistry::new();
//!     registry.register(SetReminder::new());
//!
//!     let mut params = HashMap::new();
//!     params.insert("title".to_string(), Value::String("standup".to_string()));
//!     params.insert("datetime".to_string(), Value::String("2026-09-01T09:00:00".to_string()));
//!
//!     let result = registry.execute("set_reminder", params).await.unwrap();
//!     println!("{}", result.content);
//! }
//! ```

mod error;
mod registry;
mod tool;
pub mod tools;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolArgs, ToolOutput};
pub use tools::{
    fallback_target, mime_for, output_filename, validate_conversion, FileConversion, GenerateAudio,
    GenerateImage, GenerateVideo, MediaConfig, ModifyImage, SearchResult, SetReminder, WebSearch,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a registry with every built-in tool registered.
pub fn default_registry(media: MediaConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    registry.register(GenerateImage::new(media.clone()));
    registry.register(GenerateVideo::new(media.clone()));
    registry.register(GenerateAudio::new(media.clone()));
    registry.register(ModifyImage::new(media));
    registry.register(WebSearch::from_env()?);
    registry.register(SetReminder::new());
    registry.register(FileConversion::from_env()?);

    Ok(registry)
}
