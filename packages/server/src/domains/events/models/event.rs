use anyhow::Result;
use chrono::{DateTime, Utc};
use retrieval::events::EventDraft;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A calendar-style event extracted from a document at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DetectedEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub confidence: f32,
    pub source_text: String,
    pub created_at: DateTime<Utc>,
}

impl DetectedEvent {
    pub async fn create(
        user_id: Uuid,
        document_id: Uuid,
        draft: &EventDraft,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO detected_events
                (user_id, document_id, title, start_time, end_time, location, confidence, source_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(document_id)
        .bind(&draft.title)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(draft.location.as_deref())
        .bind(draft.confidence)
        .bind(&draft.source_text)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// All events for a user, newest first.
    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM detected_events WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Events detected in one document, newest first.
    pub async fn list_for_document(document_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM detected_events WHERE document_id = $1 ORDER BY created_at DESC",
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
