//! Engine configuration.

use std::env;

/// Tunables for the turn engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Turns of history kept per session.
    pub max_history_turns: usize,

    /// Sessions tracked before LRU eviction.
    pub max_sessions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 20,
            max_sessions: 10000,
        }
    }
}

impl EngineConfig {
    /// Read configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ENGINE_MAX_HISTORY_TURNS` - Turns kept per session (default: 20)
    /// - `ENGINE_MAX_SESSIONS` - Session cap before eviction (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_history_turns: env::var("ENGINE_MAX_HISTORY_TURNS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_history_turns),
            max_sessions: env::var("ENGINE_MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_sessions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_history_turns, 20);
        assert_eq!(config.max_sessions, 10000);
    }
}
