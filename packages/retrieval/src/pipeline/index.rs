//! The chunk index: ingestion-side gateway over embedder + vector store.
//!
//! Embedding runs with bounded concurrency but point ids and ordinals
//! are assigned before any embedding starts, so identity stays
//! deterministic regardless of completion order. A failed chunk is
//! logged and skipped; only the all-chunks-failed case aborts, so a
//! flaky provider degrades recall instead of failing whole documents.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunker::chunk_words;
use crate::error::{PipelineError, StoreError};
use crate::traits::ai::Embedder;
use crate::traits::store::{point_id, ChunkMatch, ChunkPoint, VectorStore};

/// Default chunk size in words.
pub const DEFAULT_CHUNK_WORDS: usize = 300;

/// Default number of concurrent embedding calls per document.
pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;

/// Counts from indexing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Chunks produced from the text.
    pub chunks_total: usize,
    /// Chunks embedded and stored.
    pub chunks_indexed: usize,
    /// Chunks skipped after an embedding failure.
    pub chunks_skipped: usize,
}

/// Ingestion and search gateway over the vector store.
///
/// Dependencies are constructor-injected; there is no ambient client
/// state. Clone is cheap (all fields are shared handles).
#[derive(Clone)]
pub struct ChunkIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunk_words: usize,
    embed_concurrency: usize,
}

impl ChunkIndex {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            chunk_words: DEFAULT_CHUNK_WORDS,
            embed_concurrency: DEFAULT_EMBED_CONCURRENCY,
        }
    }

    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words.max(1);
        self
    }

    pub fn with_embed_concurrency(mut self, concurrency: usize) -> Self {
        self.embed_concurrency = concurrency.max(1);
        self
    }

    /// Ensure the store's schema exists for this embedder's dimension.
    ///
    /// Run once at process start; a failure here is a configuration
    /// error and should abort startup, not be retried per request.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        self.store.ensure_schema(self.embedder.dimension()).await
    }

    /// Chunk `text`, embed each chunk, and upsert the survivors.
    ///
    /// Point ids derive from `(document_id, ordinal)`, so re-indexing
    /// the same document overwrites in place. Returns
    /// [`StoreError::NoChunksEmbedded`] when not a single chunk made it.
    pub async fn index_document(
        &self,
        user_id: &str,
        document_id: Uuid,
        text: &str,
    ) -> Result<IndexOutcome, PipelineError> {
        let chunks = chunk_words(text, self.chunk_words);
        let chunks_total = chunks.len();

        let embedded: Vec<Option<ChunkPoint>> = futures::stream::iter(
            chunks.into_iter().enumerate().map(|(ordinal, content)| {
                let embedder = Arc::clone(&self.embedder);
                let user_id = user_id.to_string();
                async move {
                    let ordinal = ordinal as u32;
                    match embedder.embed(&content).await {
                        Ok(embedding) => Some(ChunkPoint {
                            id: point_id(document_id, ordinal),
                            user_id,
                            document_id,
                            ordinal,
                            content,
                            embedding,
                        }),
                        Err(e) => {
                            warn!(
                                %document_id,
                                ordinal,
                                error = %e,
                                "embedding failed for chunk, skipping"
                            );
                            None
                        }
                    }
                }
            }),
        )
        // buffered() preserves input order even when calls finish
        // out of order.
        .buffered(self.embed_concurrency)
        .collect()
        .await;

        let points: Vec<ChunkPoint> = embedded.into_iter().flatten().collect();
        let chunks_indexed = points.len();
        let chunks_skipped = chunks_total - chunks_indexed;

        if points.is_empty() {
            return Err(StoreError::NoChunksEmbedded { document_id }.into());
        }

        self.store.upsert(points).await?;

        info!(
            %document_id,
            chunks_total,
            chunks_indexed,
            chunks_skipped,
            "document indexed"
        );

        Ok(IndexOutcome {
            chunks_total,
            chunks_indexed,
            chunks_skipped,
        })
    }

    /// Embed `query` and return the caller's nearest chunks.
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, PipelineError> {
        let vector = self.embedder.embed(query).await?;
        let matches = self.store.search(user_id, &vector, limit).await?;
        Ok(matches)
    }

    /// Drop every stored point for a document.
    pub async fn remove_document(
        &self,
        user_id: &str,
        document_id: Uuid,
    ) -> Result<(), PipelineError> {
        self.store.delete_document(user_id, document_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::InMemoryVectorStore;
    use crate::testing::MockEmbedder;

    fn index_with(embedder: MockEmbedder) -> (ChunkIndex, Arc<InMemoryVectorStore>) {
        let store = Arc::new(InMemoryVectorStore::new());
        let index = ChunkIndex::new(store.clone(), Arc::new(embedder)).with_chunk_words(3);
        (index, store)
    }

    #[tokio::test]
    async fn indexes_all_chunks() {
        let (index, store) = index_with(MockEmbedder::new(16));
        let doc = Uuid::new_v4();

        let outcome = index
            .index_document("user-a", doc, "one two three four five six seven")
            .await
            .unwrap();

        assert_eq!(outcome.chunks_total, 3);
        assert_eq!(outcome.chunks_indexed, 3);
        assert_eq!(outcome.chunks_skipped, 0);
        assert_eq!(store.point_count(), 3);
    }

    #[tokio::test]
    async fn one_failed_chunk_is_skipped_not_fatal() {
        let embedder = MockEmbedder::new(16).failing_on("four five six");
        let (index, store) = index_with(embedder);
        let doc = Uuid::new_v4();

        let outcome = index
            .index_document("user-a", doc, "one two three four five six seven")
            .await
            .unwrap();

        assert_eq!(outcome.chunks_indexed, 2);
        assert_eq!(outcome.chunks_skipped, 1);
        assert_eq!(store.point_count(), 2);
        // Surviving ordinals keep their identity.
        let ordinals = store.ordinals_for(doc);
        assert_eq!(ordinals, vec![0, 2]);
    }

    #[tokio::test]
    async fn all_chunks_failing_is_no_chunks_embedded() {
        let embedder = MockEmbedder::new(16).failing_always();
        let (index, store) = index_with(embedder);
        let doc = Uuid::new_v4();

        let err = index
            .index_document("user-a", doc, "one two three")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Store(StoreError::NoChunksEmbedded { document_id })
                if document_id == doc
        ));
        assert_eq!(store.point_count(), 0);
    }

    #[tokio::test]
    async fn empty_text_is_no_chunks_embedded() {
        let (index, _store) = index_with(MockEmbedder::new(16));
        let err = index
            .index_document("user-a", Uuid::new_v4(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Store(StoreError::NoChunksEmbedded { .. })
        ));
    }

    #[tokio::test]
    async fn reindexing_overwrites_instead_of_duplicating() {
        let (index, store) = index_with(MockEmbedder::new(16));
        let doc = Uuid::new_v4();

        index
            .index_document("user-a", doc, "one two three four")
            .await
            .unwrap();
        index
            .index_document("user-a", doc, "one two three four")
            .await
            .unwrap();

        assert_eq!(store.point_count(), 2);
    }

    #[tokio::test]
    async fn concurrency_does_not_change_ordinal_assignment() {
        let store = Arc::new(InMemoryVectorStore::new());
        let index = ChunkIndex::new(store.clone(), Arc::new(MockEmbedder::new(16)))
            .with_chunk_words(1)
            .with_embed_concurrency(8);
        let doc = Uuid::new_v4();

        index
            .index_document("user-a", doc, "a b c d e f g h")
            .await
            .unwrap();

        assert_eq!(store.ordinals_for(doc), (0..8).collect::<Vec<u32>>());
        assert_eq!(store.content_at(doc, 3).as_deref(), Some("d"));
    }
}
