//! In-process session store.
//!
//! Per-session conversation tracking with turn-based trimming and LRU
//! eviction to bound memory. Persistence proper is an external concern;
//! this store exists so the engine can degrade gracefully to local state
//! when that collaborator is unreachable.

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::message::HistoryMessage;

/// Default maximum number of sessions to track before LRU eviction.
const DEFAULT_MAX_SESSIONS: usize = 10000;

/// One tracked conversation session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Messages, oldest first.
    pub messages: Vec<HistoryMessage>,
    /// Owning user id once the session is linked to an account.
    pub owner: Option<String>,
}

/// Per-session conversation store with LRU eviction.
#[derive(Debug)]
pub struct SessionStore {
    /// Map from session id to session. IndexMap keeps insertion order
    /// for LRU eviction.
    sessions: RwLock<IndexMap<String, Session>>,
    /// Maximum number of turns (user + model pairs) to keep per session.
    max_turns: usize,
    /// Maximum number of sessions before LRU eviction.
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(20)
    }
}

impl SessionStore {
    /// Create a store keeping `max_turns` turns per session.
    pub fn new(max_turns: usize) -> Self {
        Self::with_limits(max_turns, DEFAULT_MAX_SESSIONS)
    }

    /// Create a store with custom limits.
    pub fn with_limits(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(IndexMap::new()),
            max_turns,
            max_sessions,
        }
    }

    /// Get the messages for a session, marking it recently used.
    pub async fn get(&self, session_id: &str) -> Vec<HistoryMessage> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.shift_remove(session_id) {
            let messages = session.messages.clone();
            sessions.insert(session_id.to_string(), session);
            messages
        } else {
            Vec::new()
        }
    }

    /// Append a user/model exchange atomically (one write-lock hold).
    ///
    /// Creates the session if needed, trims to the turn cap, and evicts
    /// the least recently used sessions past the session cap.
    pub async fn append_exchange(
        &self,
        session_id: &str,
        user_msg: HistoryMessage,
        model_msg: HistoryMessage,
    ) {
        let mut sessions = self.sessions.write().await;

        let mut session = sessions.shift_remove(session_id).unwrap_or_default();
        session.messages.push(user_msg);
        session.messages.push(model_msg);

        let max_messages = self.max_turns * 2;
        if session.messages.len() > max_messages {
            let to_remove = session.messages.len() - max_messages;
            session.messages.drain(0..to_remove);
        }

        sessions.insert(session_id.to_string(), session);

        while sessions.len() > self.max_sessions {
            sessions.shift_remove_index(0);
        }
    }

    /// Link a session to an owning user.
    ///
    /// Check-then-write: an already-owned session is left untouched.
    /// Concurrent first-time links race, but every interleaving ends with
    /// a single stable owner, so the race is benign.
    pub async fn link_owner(&self, session_id: &str, user_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.owner.is_none() => {
                session.owner = Some(user_id.to_string());
                true
            }
            _ => false,
        }
    }

    /// The owner of a session, if linked.
    pub async fn owner(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).and_then(|s| s.owner.clone())
    }

    /// Drop a session.
    pub async fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.shift_remove(session_id);
    }

    /// Number of tracked sessions.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
