//! Prompt assembly for chat conversations.
//!
//! Builds the message sequence handed to a chat backend: one system
//! instruction (with the conversation's uploaded document embedded
//! when one exists), the prior turns in order, then the new user
//! message. Pure and deterministic; inputs are never mutated.

use crate::models::chat::ChatMessage;
use crate::models::document::DocumentContext;

/// System instruction used when no document has been uploaded.
const PERSONA: &str = "You are a helpful assistant.";

/// System instruction prefix used when a document is available.
const DOCUMENT_PERSONA: &str = "You are a helpful assistant. You have been provided with \
     the following document. Use it to answer the user's questions if they are relevant.";

/// Appended in place of document text removed by truncation.
pub const TRUNCATION_MARKER: &str = "[document truncated]";

/// An assembled model invocation: exactly one system instruction plus
/// the ordered user/assistant messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

/// Assemble the prompt for one chat turn.
///
/// When `document` is present its text is embedded verbatim in the
/// system instruction between `--- DOCUMENT START ---` and
/// `--- DOCUMENT END ---` markers. Documents longer than
/// `max_document_chars` are cut at a char boundary and the cut is
/// marked with [`TRUNCATION_MARKER`]. Without a document the system
/// instruction degrades to a generic assistant persona.
pub fn build_prompt(
    document: Option<&DocumentContext>,
    history: &[ChatMessage],
    user_message: &str,
    max_document_chars: usize,
) -> Prompt {
    let system = match document {
        Some(doc) => {
            let text = truncate_chars(&doc.text, max_document_chars);
            format!("{DOCUMENT_PERSONA}\n\n--- DOCUMENT START ---\n{text}\n--- DOCUMENT END ---")
        }
        None => PERSONA.to_string(),
    };

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(user_message));

    Prompt { system, messages }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut cut = text[..byte_index].to_string();
            cut.push('\n');
            cut.push_str(TRUNCATION_MARKER);
            cut
        }
        None => text.to_string(),
    }
}
