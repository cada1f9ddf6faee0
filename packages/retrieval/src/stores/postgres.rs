//! PostgreSQL + pgvector store.
//!
//! One table holds every user's chunk points; isolation is the
//! `user_id` predicate applied inside SQL on every search. Schema
//! bootstrap is idempotent (`IF NOT EXISTS` throughout) so repeated
//! startups are safe.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::store::{ChunkMatch, ChunkPoint, VectorStore};

/// pgvector-backed [`VectorStore`].
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    /// Wrap an existing pool (the application's composition root owns
    /// the pool lifecycle).
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a dedicated pool. Mostly for tools and tests.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StoreError::unavailable)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn ensure_schema(&self, dimension: usize) -> Result<(), StoreError> {
        // Extension creation needs superuser on some hosts; if it is
        // already installed this is a no-op, and if it is missing the
        // table creation below will surface the real error.
        if let Err(e) = sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
        {
            warn!(error = %e, "could not create pgvector extension");
        }

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS document_chunks (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                document_id UUID NOT NULL,
                ordinal INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding vector({dimension}) NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        // Keyword index on the tenant key keeps filtered search cheap.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_document_chunks_user_id ON document_chunks(user_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_document_chunks_document_id ON document_chunks(document_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        // HNSW needs pgvector >= 0.5; best-effort, search works
        // without it (sequential scan).
        if let Err(e) = sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_document_chunks_embedding
            ON document_chunks USING hnsw (embedding vector_cosine_ops)
            "#,
        )
        .execute(&self.pool)
        .await
        {
            warn!(error = %e, "could not create HNSW index");
        }

        info!(dimension, "vector store schema ready");
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), StoreError> {
        for point in points {
            let ChunkPoint {
                id,
                user_id,
                document_id,
                ordinal,
                content,
                embedding,
            } = point;
            sqlx::query(
                r#"
                INSERT INTO document_chunks (id, user_id, document_id, ordinal, content, embedding)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE
                SET user_id = EXCLUDED.user_id,
                    document_id = EXCLUDED.document_id,
                    ordinal = EXCLUDED.ordinal,
                    content = EXCLUDED.content,
                    embedding = EXCLUDED.embedding
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(document_id)
            .bind(ordinal as i32)
            .bind(content)
            .bind(Vector::from(embedding))
            .execute(&self.pool)
            .await
            .map_err(StoreError::unavailable)?;
        }
        Ok(())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, StoreError> {
        // The user filter is part of the query; results can never
        // contain another tenant's points.
        let rows = sqlx::query_as::<_, (Uuid, i32, String)>(
            r#"
            SELECT document_id, ordinal, content
            FROM document_chunks
            WHERE user_id = $1
            ORDER BY embedding <=> $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(Vector::from(query.to_vec()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        Ok(rows
            .into_iter()
            .map(|(document_id, ordinal, content)| ChunkMatch {
                document_id,
                ordinal: ordinal as u32,
                content,
            })
            .collect())
    }

    async fn delete_document(
        &self,
        user_id: &str,
        document_id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM document_chunks WHERE user_id = $1 AND document_id = $2")
            .bind(user_id)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::unavailable)?;
        Ok(())
    }
}
