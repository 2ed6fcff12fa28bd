//! Provider error types.

use thiserror::Error;

/// Errors returned by chat model providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the call due to rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider returned a non-success API status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider responded but the body could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Whether this error is a rate-limit signal eligible for backoff retry.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_)) || matches!(self, Self::Api { status: 429, .. })
    }
}
