//! Core types for the Sona assistant backend.
//!
//! This crate defines the shared vocabulary of the workspace:
//!
//! - Message, attachment, and turn request types ([`TurnRequest`])
//! - The [`Mode`] enum and the pure [`detect_mode`] classifier
//! - Reply [`Language`] detection for mirroring and localization
//! - The system-instruction builder ([`build_instruction`])
//! - The [`ChatModel`] trait implemented by provider clients
//! - The in-process [`SessionStore`]
//!
//! # Example
//!
//! ```rust
//! use chat_core::{detect_mode, Mode};
//!
//! let mode = detect_mode("generate an image of a red bicycle", &[]);
//! assert_eq!(mode, Mode::ImageGen);
//! ```

mod error;
mod history;
mod instruction;
mod language;
mod message;
mod mode;
mod model;

pub use error::ProviderError;
pub use history::{Session, SessionStore};
pub use instruction::{
    build_instruction, mode_instruction, tool_usage_rules, InstructionContext, DEFAULT_CATEGORY,
    DEFAULT_PERSONA, SPLIT_RESPONSE_DELIMITER,
};
pub use language::{detect_language, Language};
pub use message::{Attachment, AttachmentKind, HistoryMessage, Role, TurnRequest};
pub use mode::{coerce_for_persona, detect_mode, Mode};
pub use model::{ChatModel, ModelRequest, ProviderReply, ToolCall};
