//! Provider routing with retry and fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use chat_core::{ChatModel, ModelRequest, ProviderError, ProviderReply};
use openai_brain::AltProvider;

/// Attempt ceiling against the default provider.
const MAX_DEFAULT_ATTEMPTS: u32 = 3;

/// Routes generation calls between the default provider and the
/// alternates.
///
/// A non-default model hint gets exactly one call to its alternate;
/// any failure there falls back silently to the default. The default
/// provider gets up to three attempts, retrying only on rate limits
/// with exponential backoff (2s, then 4s). Other errors propagate
/// immediately.
pub struct ProviderRouter {
    default: Arc<dyn ChatModel>,
    alternates: HashMap<&'static str, Arc<dyn ChatModel>>,
}

impl ProviderRouter {
    /// Create a router around the default provider.
    pub fn new(default: Arc<dyn ChatModel>) -> Self {
        Self {
            default,
            alternates: HashMap::new(),
        }
    }

    /// Register an alternate provider model.
    pub fn with_alternate(mut self, provider: AltProvider, model: Arc<dyn ChatModel>) -> Self {
        self.alternates.insert(provider.name(), model);
        self
    }

    /// Route one generation call.
    pub async fn generate(&self, request: &ModelRequest) -> Result<ProviderReply, ProviderError> {
        if let Some(hint) = request.model.as_deref() {
            if let Some(provider) = AltProvider::from_model_hint(hint) {
                if let Some(model) = self.alternates.get(provider.name()) {
                    info!(provider = provider.name(), hint, "routing to alternate provider");
                    match model.generate(request).await {
                        Ok(reply) => return Ok(reply),
                        Err(e) => {
                            // The user asked for a specific model, but a broken
                            // alternate must not break the turn.
                            warn!(
                                provider = provider.name(),
                                error = %e,
                                "alternate provider failed, falling back to default"
                            );
                        }
                    }
                }
            }
        }

        self.generate_default(request).await
    }

    async fn generate_default(
        &self,
        request: &ModelRequest,
    ) -> Result<ProviderReply, ProviderError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.default.generate(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_rate_limit() && attempt < MAX_DEFAULT_ATTEMPTS => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    warn!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        "rate limited, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
