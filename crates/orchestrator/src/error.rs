//! Error types for turn processing.

use thiserror::Error;

use chat_core::ProviderError;

/// Errors that can occur while processing a turn.
///
/// Tool and extraction failures are absorbed where they happen, so the
/// only way a turn fails outright is the generation call itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// All provider attempts for the turn failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
