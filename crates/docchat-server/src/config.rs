//! Environment configuration, read once at startup.
//!
//! A missing or invalid value fails the process before it binds a
//! socket; nothing here is re-read per request.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use eyre::eyre;

use docchat_model::backend::BackendKind;
use docchat_model::{groq, ollama};

/// Upload size cap (raw file bytes).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Default backend; a chat request may override it per call.
    pub backend: BackendKind,
    pub port: u16,
    /// Chat response shape: chunked text stream vs buffered JSON.
    pub stream_responses: bool,
    /// Conversation memory flag; disabled memory evaluates every turn
    /// with only the latest user message.
    pub memory_enabled: bool,
    /// Documents longer than this are truncated in the prompt.
    pub max_document_chars: usize,
    pub max_upload_bytes: usize,
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub groq_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let backend: BackendKind = env::var("DOCCHAT_BACKEND")
            .unwrap_or_else(|_| "ollama".to_string())
            .parse()
            .map_err(|e| eyre!("DOCCHAT_BACKEND: {e}"))?;

        let groq_api_key = env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        if backend == BackendKind::Groq && groq_api_key.is_none() {
            return Err(eyre!("GROQ_API_KEY is required when DOCCHAT_BACKEND=groq"));
        }

        Ok(Self {
            backend,
            port: parse_var("DOCCHAT_PORT", 8080)?,
            stream_responses: parse_var("DOCCHAT_STREAM", false)?,
            memory_enabled: parse_var("DOCCHAT_MEMORY", true)?,
            max_document_chars: parse_var("DOCCHAT_MAX_DOCUMENT_CHARS", 100_000)?,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            groq_api_key,
            groq_base_url: env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| groq::DEFAULT_BASE_URL.to_string()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| groq::DEFAULT_MODEL.to_string()),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| ollama::DEFAULT_BASE_URL.to_string()),
            ollama_model: env::var("OLLAMA_MODEL")
                .unwrap_or_else(|_| ollama::DEFAULT_MODEL.to_string()),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| eyre!("{name}: invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
