//! Vector store abstraction.
//!
//! The pipeline depends only on this operation set (idempotent schema
//! bootstrap, upsert by stable point id, and a user-filtered
//! nearest-neighbor query), not on any specific store or transport.
//!
//! Tenant isolation lives here: `search` filters by user id inside the
//! store implementation (SQL predicate, index filter), never by
//! post-filtering results client-side.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;

/// Namespace for deterministic chunk point ids.
const POINT_NAMESPACE: Uuid = Uuid::from_bytes([
    0x8d, 0x4a, 0x1f, 0x52, 0x6b, 0x3e, 0x4c, 0x9a, 0x91, 0x7c, 0x2f, 0x05, 0xd8, 0x33, 0x6e,
    0x41,
]);

/// Stable point identity for a chunk: a function of
/// `(document_id, ordinal)` only, so re-processing the same document
/// overwrites points in place instead of accumulating duplicates.
pub fn point_id(document_id: Uuid, ordinal: u32) -> Uuid {
    Uuid::new_v5(
        &POINT_NAMESPACE,
        format!("{document_id}:{ordinal}").as_bytes(),
    )
}

/// A chunk with its embedding, ready to be stored.
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    /// Deterministic id from [`point_id`].
    pub id: Uuid,
    /// Owning user, the tenant isolation key.
    pub user_id: String,
    /// Owning document.
    pub document_id: Uuid,
    /// Dense, zero-based position within the document.
    pub ordinal: u32,
    /// The literal text span.
    pub content: String,
    /// Embedding vector for the span.
    pub embedding: Vec<f32>,
}

/// A search hit. Similarity scores stay inside the store; callers get
/// chunks back in descending similarity order.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub document_id: Uuid,
    pub ordinal: u32,
    pub content: String,
}

/// Per-user vector collection: schema lifecycle, indexed upsert,
/// filtered nearest-neighbor search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Ensure the collection exists with the given vector
    /// dimensionality and a cosine metric, plus a keyword index on the
    /// user id field. Idempotent: "already exists" is success. Run once
    /// at process start; failure here is fatal, not per-request.
    async fn ensure_schema(&self, dimension: usize) -> Result<(), StoreError>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), StoreError>;

    /// Up to `limit` nearest points by cosine similarity, restricted to
    /// `user_id` inside the store.
    async fn search(
        &self,
        user_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, StoreError>;

    /// Remove every point belonging to a document so nothing is left
    /// orphaned when the document's content changes or goes away.
    async fn delete_document(&self, user_id: &str, document_id: Uuid)
        -> Result<(), StoreError>;
}

/// Cosine similarity between two vectors of equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_deterministic() {
        let doc = Uuid::new_v4();
        assert_eq!(point_id(doc, 0), point_id(doc, 0));
        assert_eq!(point_id(doc, 7), point_id(doc, 7));
    }

    #[test]
    fn point_id_differs_across_ordinals_and_documents() {
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();
        assert_ne!(point_id(doc_a, 0), point_id(doc_a, 1));
        assert_ne!(point_id(doc_a, 0), point_id(doc_b, 0));
    }

    #[test]
    fn cosine_similarity_basics() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!(cosine_similarity(&a, &a) > 0.999);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[]), 0.0);
    }
}
