//! In-memory vector store for tests and development.
//!
//! Brute-force cosine scan. Not suitable for production: data is lost
//! on restart and search is O(points).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::store::{cosine_similarity, ChunkMatch, ChunkPoint, VectorStore};

#[derive(Default)]
pub struct InMemoryVectorStore {
    points: RwLock<HashMap<Uuid, ChunkPoint>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self) -> usize {
        self.points.read().unwrap().len()
    }

    /// Stored ordinals for a document, ascending.
    pub fn ordinals_for(&self, document_id: Uuid) -> Vec<u32> {
        let mut ordinals: Vec<u32> = self
            .points
            .read()
            .unwrap()
            .values()
            .filter(|p| p.document_id == document_id)
            .map(|p| p.ordinal)
            .collect();
        ordinals.sort_unstable();
        ordinals
    }

    /// Stored content at a given document ordinal.
    pub fn content_at(&self, document_id: Uuid, ordinal: u32) -> Option<String> {
        self.points
            .read()
            .unwrap()
            .values()
            .find(|p| p.document_id == document_id && p.ordinal == ordinal)
            .map(|p| p.content.clone())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_schema(&self, _dimension: usize) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), StoreError> {
        let mut stored = self.points.write().unwrap();
        for point in points {
            stored.insert(point.id, point);
        }
        Ok(())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, StoreError> {
        let stored = self.points.read().unwrap();

        let mut scored: Vec<(f32, ChunkMatch)> = stored
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| {
                (
                    cosine_similarity(&p.embedding, query),
                    ChunkMatch {
                        document_id: p.document_id,
                        ordinal: p.ordinal,
                        content: p.content.clone(),
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, m)| m).collect())
    }

    async fn delete_document(
        &self,
        user_id: &str,
        document_id: Uuid,
    ) -> Result<(), StoreError> {
        self.points
            .write()
            .unwrap()
            .retain(|_, p| !(p.user_id == user_id && p.document_id == document_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::store::point_id;

    fn point(user: &str, doc: Uuid, ordinal: u32, embedding: Vec<f32>) -> ChunkPoint {
        ChunkPoint {
            id: point_id(doc, ordinal),
            user_id: user.to_string(),
            document_id: doc,
            ordinal,
            content: format!("chunk {ordinal} of {user}"),
            embedding,
        }
    }

    #[tokio::test]
    async fn search_never_crosses_users() {
        let store = InMemoryVectorStore::new();
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();

        // Near-identical vectors for both users.
        store
            .upsert(vec![
                point("user-a", doc_a, 0, vec![1.0, 0.0, 0.0]),
                point("user-b", doc_b, 0, vec![0.99, 0.01, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.search("user-a", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, doc_a);
        assert!(hits[0].content.contains("user-a"));
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_caps_at_limit() {
        let store = InMemoryVectorStore::new();
        let doc = Uuid::new_v4();

        store
            .upsert(vec![
                point("u", doc, 0, vec![1.0, 0.0]),
                point("u", doc, 1, vec![0.7, 0.7]),
                point("u", doc, 2, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.search("u", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].ordinal, 0);
        assert_eq!(hits[1].ordinal, 1);
    }

    #[tokio::test]
    async fn upsert_by_id_overwrites() {
        let store = InMemoryVectorStore::new();
        let doc = Uuid::new_v4();

        store
            .upsert(vec![point("u", doc, 0, vec![1.0])])
            .await
            .unwrap();
        store
            .upsert(vec![point("u", doc, 0, vec![0.5])])
            .await
            .unwrap();

        assert_eq!(store.point_count(), 1);
    }

    #[tokio::test]
    async fn delete_document_leaves_other_documents_alone() {
        let store = InMemoryVectorStore::new();
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();

        store
            .upsert(vec![
                point("u", doc_a, 0, vec![1.0]),
                point("u", doc_b, 0, vec![1.0]),
            ])
            .await
            .unwrap();

        store.delete_document("u", doc_a).await.unwrap();
        assert_eq!(store.point_count(), 1);
        assert_eq!(store.ordinals_for(doc_b), vec![0]);
    }
}
