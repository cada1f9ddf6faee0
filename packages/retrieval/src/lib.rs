//! Per-user document ingestion and retrieval pipeline.
//!
//! This library turns user documents into searchable vector points and
//! answers natural-language questions from them (retrieval-augmented
//! generation). It deliberately treats the expensive collaborators as
//! narrow, swappable traits:
//!
//! - [`Embedder`] - text to fixed-dimension vector
//! - [`CompletionModel`] - prompt to text (plus a streaming variant)
//! - [`VectorStore`] - upsert and filtered nearest-neighbor search
//! - [`BlobStore`] - disposable storage for original file bytes
//!
//! The application composes these into a [`ChunkIndex`] (ingestion side)
//! and an [`AnswerEngine`] (query side). Tenant isolation is the store's
//! job: every search is filtered by user id inside the store, never by
//! post-filtering results.
//!
//! # Modules
//!
//! - [`chunker`] - deterministic word-window chunking
//! - [`extract`] - PDF validation and text extraction
//! - [`events`] - best-effort event detection from document text
//! - [`pipeline`] - the ingestion and answer orchestrators
//! - [`stores`] - vector store implementations
//! - [`testing`] - deterministic mocks for tests

pub mod ai;
pub mod chunker;
pub mod credentials;
pub mod error;
pub mod events;
pub mod extract;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;

pub use credentials::SecretString;
pub use error::{
    BlobError, EmbedError, ExtractError, GenerateError, PipelineError, Result, StoreError,
};
pub use pipeline::{
    answer::{Answer, AnswerEngine},
    index::{ChunkIndex, IndexOutcome},
};
pub use traits::{
    ai::{CompletionModel, CompletionStream, Embedder},
    blob::{BlobStore, StoredBlob},
    store::{point_id, ChunkMatch, ChunkPoint, VectorStore},
};
