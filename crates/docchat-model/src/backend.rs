//! The chat-completion capability shared by all backends.

use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use docchat_core::models::chat::ChatRole;
use docchat_core::prompt::Prompt;

use crate::error::ModelError;

/// Per-request timeout applied at client construction. Generous:
/// model completions routinely take tens of seconds.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// A lazy, finite, non-restartable sequence of completion fragments.
///
/// Fragments concatenate to the full completion; no fragment is
/// delivered twice. A mid-stream failure surfaces as a terminal `Err`
/// item, after which the sequence ends — fragments already delivered
/// are not retracted.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// A chat-completion backend. The two implementations (Groq, Ollama)
/// are interchangeable from the caller's perspective: identical
/// prompt in, identical completion semantics out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Buffered invocation: returns only once the full completion is
    /// available.
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError>;

    /// Streaming invocation. Request-level failures (connection,
    /// non-2xx status) surface here before any fragment is produced.
    async fn stream(&self, prompt: &Prompt) -> Result<TokenStream, ModelError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Which backend serves a request. Resolved once per request from the
/// optional request override, falling back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Groq,
    Ollama,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            other => Err(ModelError::UnknownBackend(other.to_string())),
        }
    }
}

// ── Shared wire helpers ──────────────────────────────────────────────────────

/// A message as both backends' chat APIs expect it.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

/// Flatten a prompt into the wire message list: the system
/// instruction first, then the history and new user message in order.
pub(crate) fn wire_messages(prompt: &Prompt) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(prompt.messages.len() + 1);
    messages.push(WireMessage {
        role: "system",
        content: prompt.system.clone(),
    });
    for message in &prompt.messages {
        messages.push(WireMessage {
            role: match message.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: message.content.clone(),
        });
    }
    messages
}

/// Turn a non-2xx response into `ModelError::Invocation` carrying the
/// status and a short slice of the body.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail: String = body.chars().take(200).collect();
    Err(ModelError::Invocation(format!("{status}: {detail}")))
}

/// Split a byte stream into trimmed, non-empty lines.
///
/// Lines may span chunk boundaries. A final line not terminated by a
/// newline is still emitted when the stream ends, so no trailing
/// fragment is lost. A transport error ends the sequence with a
/// terminal `Err`.
pub(crate) fn line_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, ModelError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut buffer = String::new();

        while let Some(chunk) = futures::StreamExt::next(&mut bytes).await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ModelError::Stream(e.to_string()));
                    return;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                if !line.is_empty() {
                    yield Ok(line);
                }
            }
        }

        let tail = buffer.trim().to_string();
        if !tail.is_empty() {
            yield Ok(tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::models::chat::ChatMessage;

    #[test]
    fn wire_messages_put_system_first() {
        let prompt = Prompt {
            system: "be helpful".to_string(),
            messages: vec![
                ChatMessage::user("q1"),
                ChatMessage::assistant("a1"),
                ChatMessage::user("q2"),
            ],
        };

        let wire = wire_messages(&prompt);

        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[0].content, "be helpful");
        assert_eq!(wire[1].role, "user");
        assert_eq!(wire[2].role, "assistant");
        assert_eq!(wire[3].role, "user");
        assert_eq!(wire[3].content, "q2");
    }

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("groq".parse::<BackendKind>().unwrap(), BackendKind::Groq);
        assert_eq!("Ollama".parse::<BackendKind>().unwrap(), BackendKind::Ollama);
        assert!("gpt4".parse::<BackendKind>().is_err());
    }

    fn collect_lines(chunks: Vec<Result<&'static [u8], String>>) -> Vec<Result<String, ModelError>> {
        use futures::StreamExt;
        futures::executor::block_on(line_stream(futures::stream::iter(chunks)).collect())
    }

    #[test]
    fn line_stream_reassembles_lines_split_across_chunks() {
        let lines = collect_lines(vec![Ok(b"alpha\nbe"), Ok(b"ta\n")]);
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, ["alpha", "beta"]);
    }

    #[test]
    fn line_stream_emits_unterminated_final_line() {
        let lines = collect_lines(vec![Ok(b"first\n"), Ok(b"last without newline")]);
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, ["first", "last without newline"]);
    }

    #[test]
    fn line_stream_skips_blank_separator_lines() {
        let lines = collect_lines(vec![Ok(b"data: a\n\ndata: b\n\n")]);
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, ["data: a", "data: b"]);
    }

    #[test]
    fn line_stream_transport_error_is_terminal() {
        let lines = collect_lines(vec![Ok(b"one\n"), Err("connection reset".to_string())]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].as_ref().unwrap(), "one");
        assert!(matches!(
            &lines[1],
            Err(ModelError::Stream(msg)) if msg.contains("connection reset")
        ));
    }
}
