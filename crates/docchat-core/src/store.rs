//! In-memory document store keyed by conversation id.
//!
//! Process-local and lost on restart, which is an accepted limitation
//! of this service. Strictly a keyed map: documents for one
//! conversation are never visible to another.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::models::document::DocumentContext;

#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: RwLock<HashMap<Uuid, DocumentContext>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the document for its conversation, replacing any
    /// previous one. Callers must only invoke this after extraction
    /// fully succeeded.
    pub fn put(&self, document: DocumentContext) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(document.conversation_id, document);
    }

    /// Fetch the document for a conversation, if one was uploaded.
    /// Side-effect free.
    pub fn get(&self, conversation_id: Uuid) -> Option<DocumentContext> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&conversation_id).cloned()
    }
}
