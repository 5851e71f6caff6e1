//! Conversation memory: ordered prior turns per conversation.
//!
//! Optional by configuration — a disabled memory keeps the same code
//! path everywhere (append is a no-op, history is always empty)
//! instead of forking the orchestration logic. Entries are
//! append-only and ordered by call sequence; the orchestrator appends
//! only after a model call fully completed.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::models::chat::ChatMessage;

#[derive(Debug)]
pub struct ConversationMemory {
    enabled: bool,
    inner: RwLock<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl ConversationMemory {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Record one completed turn for a conversation.
    pub fn append(&self, conversation_id: Uuid, user_message: &str, assistant_message: &str) {
        if !self.enabled {
            return;
        }
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let turns = map.entry(conversation_id).or_default();
        turns.push(ChatMessage::user(user_message));
        turns.push(ChatMessage::assistant(assistant_message));
    }

    /// Prior turns for a conversation, oldest first. Empty when the
    /// conversation has no history or memory is disabled.
    pub fn history(&self, conversation_id: Uuid) -> Vec<ChatMessage> {
        if !self.enabled {
            return Vec::new();
        }
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&conversation_id).cloned().unwrap_or_default()
    }
}
