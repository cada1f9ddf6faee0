use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Document lifecycle states.
///
/// Transitions are monotonic: `processing` moves to exactly one of
/// `ready` or `failed` and never leaves a terminal state. The guards
/// in `mark_ready`/`mark_failed` enforce this at the SQL level so a
/// late reconciliation sweep cannot clobber a finished document.
pub mod status {
    pub const PROCESSING: &str = "processing";
    pub const READY: &str = "ready";
    pub const FAILED: &str = "failed";
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_type: String,
    #[serde(skip_serializing)]
    pub content: String,
    pub blob_url: Option<String>,
    #[serde(skip_serializing)]
    pub blob_id: Option<String>,
    pub status: String,
    pub failure_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        user_id: Uuid,
        filename: &str,
        file_type: &str,
        content: &str,
        blob_url: Option<&str>,
        blob_id: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO documents (user_id, filename, file_type, content, blob_url, blob_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'processing')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(filename)
        .bind(file_type)
        .bind(content)
        .bind(blob_url)
        .bind(blob_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Fetch a document owned by `user_id`. Returns `None` both when the
    /// id does not exist and when it belongs to someone else.
    pub async fn find_for_user(id: Uuid, user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM documents WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Transition `processing` -> `ready`.
    ///
    /// Returns `false` when the document was not in `processing` (already
    /// terminal), in which case nothing was written.
    pub async fn mark_ready(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'ready', failure_reason = NULL, updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition `processing` -> `failed` with a human-readable reason.
    pub async fn mark_failed(id: Uuid, reason: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'failed', failure_reason = $2, updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop the blob locator after the original upload has been deleted
    /// from the blob store. The extracted `content` column remains the
    /// durable source of truth.
    pub async fn clear_blob(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE documents SET blob_url = NULL, blob_id = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Find documents stuck in `processing` longer than `max_age`.
    ///
    /// These are orphans from a crashed worker or process restart; the
    /// reconciliation sweep marks them failed so clients are not left
    /// polling a document that will never finish.
    pub async fn find_stuck(max_age: Duration, pool: &PgPool) -> Result<Vec<Self>> {
        let cutoff = Utc::now() - max_age;

        sqlx::query_as::<_, Self>(
            "SELECT * FROM documents WHERE status = 'processing' AND updated_at < $1",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

/// Status-transition surface for the reconciliation sweep.
///
/// The sweep talks to this trait rather than to the pool directly so
/// the monotonic-transition contract (`processing` is the only state
/// that can move, and it moves exactly once) can be exercised against
/// an in-memory store in tests.
#[async_trait]
pub trait DocumentStatusStore: Send + Sync {
    async fn find_stuck(&self, max_age: Duration) -> Result<Vec<Document>>;
    async fn mark_ready(&self, id: Uuid) -> Result<bool>;
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<bool>;
}

/// Postgres-backed [`DocumentStatusStore`] used by the running server.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStatusStore for PgDocumentStore {
    async fn find_stuck(&self, max_age: Duration) -> Result<Vec<Document>> {
        Document::find_stuck(max_age, &self.pool).await
    }

    async fn mark_ready(&self, id: Uuid) -> Result<bool> {
        Document::mark_ready(id, &self.pool).await
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<bool> {
        Document::mark_failed(id, reason, &self.pool).await
    }
}
