use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not parse PDF: {0}")]
    Parse(String),

    #[error("PDF contains no extractable text (may be image-based)")]
    NoText,
}
