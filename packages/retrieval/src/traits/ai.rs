//! Oracle traits for the embedding and generation models.
//!
//! The pipeline depends only on these narrow interfaces so the
//! provider behind them is swappable without touching orchestration
//! logic. Implementations wrap specific providers and handle the
//! specifics of request shapes and response parsing.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::{EmbedError, GenerateError};

/// A stream of incremental text fragments from the generation oracle.
///
/// Dropping the stream cancels the underlying HTTP response, which is
/// how caller cancellation propagates to the provider.
pub type CompletionStream =
    Pin<Box<dyn Stream<Item = Result<String, GenerateError>> + Send>>;

/// Text → fixed-dimension vector oracle.
///
/// Stateless adapter with retry-free failure propagation; callers that
/// need partial-failure tolerance (the upsert loop) handle it
/// themselves.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text span.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// The fixed dimensionality of produced vectors.
    fn dimension(&self) -> usize;
}

/// Prompt → text oracle, with a streaming variant.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a prompt and return the full reply.
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError>;

    /// Complete a prompt, yielding reply fragments as they arrive.
    async fn complete_stream(&self, prompt: &str) -> Result<CompletionStream, GenerateError>;
}
