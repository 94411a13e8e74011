//! Error types for the document renderer
//!
//! Only failures that abort a single document surface here. Image and
//! network problems are reported as values and degraded at the embedder.

use thiserror::Error;

/// Custom error type for renderer operations
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for field '{0}': {1}")]
    InvalidValue(String, String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("PDF generation error: {0}")]
    Pdf(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;
