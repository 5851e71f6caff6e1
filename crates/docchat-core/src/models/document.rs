use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extracted text of an uploaded PDF, bound to one conversation.
///
/// Created only after extraction fully succeeds; a re-upload for the
/// same conversation replaces the previous document wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContext {
    pub conversation_id: Uuid,
    pub file_name: String,
    pub text: String,
    pub uploaded_at: jiff::Timestamp,
}

impl DocumentContext {
    pub fn new(
        conversation_id: Uuid,
        file_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            file_name: file_name.into(),
            text: text.into(),
            uploaded_at: jiff::Timestamp::now(),
        }
    }
}
