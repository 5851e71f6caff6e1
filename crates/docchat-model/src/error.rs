use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
