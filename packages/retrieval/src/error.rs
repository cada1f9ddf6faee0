//! Typed errors for the retrieval pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Each external
//! boundary gets its own enum so callers can tell a retrieval failure
//! from a generation failure and decide what to retry.

use thiserror::Error;
use uuid::Uuid;

/// Errors from text extraction (file bytes or remote URL).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Container validation failed before any parsing was attempted.
    #[error("invalid format: file does not start with the PDF signature")]
    InvalidFormat,

    /// Parsing succeeded but produced zero text. Usually a scanned or
    /// image-only document.
    #[error("extraction produced no text content")]
    EmptyContent,

    /// Fetching a remote artifact failed before parsing.
    #[error("fetch failed{}", status.map(|s| format!(": HTTP {s}")).unwrap_or_default())]
    FetchFailed { status: Option<u16> },

    /// The PDF parser rejected the document body.
    #[error("PDF parse error: {0}")]
    Parse(String),
}

/// Errors from the embedding oracle.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Provider returned a non-success status.
    #[error("embedding provider error: HTTP {status}")]
    Provider { status: u16 },

    /// Provider replied with an unexpected response shape.
    #[error("unexpected embedding response format: {0}")]
    Format(String),

    /// Transport-level failure talking to the provider.
    #[error("embedding request failed")]
    Transport(#[source] reqwest::Error),
}

/// Errors from the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or auth failure against the store.
    #[error("vector store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Every chunk of a document failed to embed; nothing was stored.
    /// Distinct from partial failure, which is tolerated.
    #[error("no chunks were successfully embedded for document {document_id}")]
    NoChunksEmbedded { document_id: Uuid },
}

impl StoreError {
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Box::new(err))
    }
}

/// Errors from the generation oracle.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Provider returned a non-success status.
    #[error("completion provider error: HTTP {status}")]
    Provider { status: u16 },

    /// Transport-level failure talking to the provider.
    #[error("completion request failed")]
    Transport(#[source] reqwest::Error),

    /// The streaming response was malformed mid-flight.
    #[error("completion stream error: {0}")]
    Stream(String),
}

/// Errors from the blob store. Callers treat these as best-effort.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob upload failed: {0}")]
    Upload(String),

    #[error("blob delete failed: {0}")]
    Delete(String),
}

/// Top-level pipeline error combining all boundaries.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether this error happened while retrieving context (embed or
    /// store) as opposed to generating the answer. Clients use this to
    /// decide whether a retry makes sense.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Embed(_) | Self::Store(_))
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failed_display_includes_status() {
        let err = ExtractError::FetchFailed { status: Some(502) };
        assert!(err.to_string().contains("HTTP 502"));

        let err = ExtractError::FetchFailed { status: None };
        assert_eq!(err.to_string(), "fetch failed");
    }

    #[test]
    fn retrieval_errors_are_distinguishable() {
        let embed: PipelineError = EmbedError::Provider { status: 503 }.into();
        let gen: PipelineError = GenerateError::Provider { status: 500 }.into();
        assert!(embed.is_retrieval());
        assert!(!gen.is_retrieval());
    }
}
