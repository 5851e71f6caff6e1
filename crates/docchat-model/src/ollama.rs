//! Local backend: an Ollama inference server's `/api/chat` endpoint.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docchat_core::prompt::Prompt;

use crate::backend::{
    ChatBackend, REQUEST_TIMEOUT, TokenStream, WireMessage, check_status, line_stream,
    wire_messages,
};
use crate::error::ModelError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let messages = wire_messages(prompt);
        let request = OllamaChatRequest {
            model: &self.model,
            messages: &messages,
            stream: false,
        };

        debug!(model = %self.model, messages = messages.len(), "ollama buffered invocation");

        let response = self
            .http
            .post(self.chat_url())
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let completion: OllamaChatResponse = response.json().await?;
        Ok(completion.message.content)
    }

    async fn stream(&self, prompt: &Prompt) -> Result<TokenStream, ModelError> {
        let messages = wire_messages(prompt);
        let request = OllamaChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        debug!(model = %self.model, messages = messages.len(), "ollama streaming invocation");

        let response = self
            .http
            .post(self.chat_url())
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut lines = Box::pin(line_stream(response.bytes_stream()));

        // Ollama streams newline-delimited JSON objects, one per
        // generated fragment, ending with a `done: true` object.
        let stream = async_stream::stream! {
            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                match parse_chunk_line(&line) {
                    Ok(chunk) => {
                        if let Some(message) = chunk.message {
                            if !message.content.is_empty() {
                                yield Ok(message.content);
                            }
                        }
                        if chunk.done {
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Parse one NDJSON line of a streamed chat response. An `error`
/// field (how Ollama reports mid-generation failures) becomes
/// `ModelError::Invocation`.
fn parse_chunk_line(line: &str) -> Result<OllamaChunk, ModelError> {
    let chunk: OllamaChunk =
        serde_json::from_str(line).map_err(|e| ModelError::ResponseParse(e.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(ModelError::Invocation(error));
    }
    Ok(chunk)
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_line_carries_fragment() {
        let line = r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#;
        let chunk = parse_chunk_line(line).unwrap();
        assert_eq!(chunk.message.unwrap().content, "Hel");
        assert!(!chunk.done);
    }

    #[test]
    fn final_chunk_sets_done() {
        let line = r#"{"message":{"role":"assistant","content":""},"done":true,"total_duration":12}"#;
        let chunk = parse_chunk_line(line).unwrap();
        assert!(chunk.done);
    }

    #[test]
    fn error_line_is_terminal() {
        let line = r#"{"error":"model not found"}"#;
        let err = parse_chunk_line(line).unwrap_err();
        assert!(matches!(err, ModelError::Invocation(msg) if msg.contains("model not found")));
    }

    #[test]
    fn request_payload_shape() {
        let messages = vec![WireMessage {
            role: "user",
            content: "hi".to_string(),
        }];
        let request = OllamaChatRequest {
            model: "llama3",
            messages: &messages,
            stream: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama3");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn malformed_line_is_parse_error() {
        assert!(matches!(
            parse_chunk_line("{truncated"),
            Err(ModelError::ResponseParse(_))
        ));
    }
}
