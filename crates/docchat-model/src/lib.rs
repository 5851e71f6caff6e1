//! docchat-model
//!
//! Chat-model invocation adapter. One capability trait
//! ([`backend::ChatBackend`]) with two interchangeable
//! implementations: the hosted Groq API ([`groq::GroqClient`]) and a
//! local Ollama server ([`ollama::OllamaClient`]). Both offer a
//! buffered call and a lazy token stream over the same prompt.

pub mod backend;
pub mod error;
pub mod groq;
pub mod ollama;
