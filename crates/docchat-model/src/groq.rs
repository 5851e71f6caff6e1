//! Hosted backend: the Groq OpenAI-compatible chat completions API.

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

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for GroqClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let messages = wire_messages(prompt);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            stream: false,
        };

        debug!(model = %self.model, messages = messages.len(), "groq buffered invocation");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let completion: ChatCompletionResponse = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::ResponseParse("no choices in response".to_string()))?;

        Ok(choice.message.content)
    }

    async fn stream(&self, prompt: &Prompt) -> Result<TokenStream, ModelError> {
        let messages = wire_messages(prompt);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        debug!(model = %self.model, messages = messages.len(), "groq streaming invocation");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut lines = Box::pin(line_stream(response.bytes_stream()));

        let stream = async_stream::stream! {
            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    return;
                }
                match parse_sse_data(data) {
                    Ok(Some(text)) => yield Ok(text),
                    Ok(None) => {}
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

/// Parse one SSE `data:` payload into its text delta, if any.
///
/// An `{"error": ...}` payload (how the API reports mid-stream
/// failures) becomes `ModelError::Invocation`.
fn parse_sse_data(data: &str) -> Result<Option<String>, ModelError> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(data) {
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown API error");
            return Err(ModelError::Invocation(message.to_string()));
        }
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| ModelError::ResponseParse(e.to_string()))?;

    let text: String = chunk
        .choices
        .iter()
        .filter_map(|choice| choice.delta.content.as_deref())
        .collect();

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}
