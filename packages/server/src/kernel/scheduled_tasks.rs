//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! A single reconciliation sweep runs every five minutes: documents that
//! have sat in `processing` past the configured timeout are marked failed
//! so a crashed worker never leaves a document that clients poll forever.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::documents::{DocumentStatusStore, PgDocumentStore};

/// Start all scheduled tasks
pub async fn start_scheduler(pool: PgPool, stuck_processing_minutes: i64) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let store: Arc<dyn DocumentStatusStore> = Arc::new(PgDocumentStore::new(pool));
    let sweep_job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let store = store.clone();
        Box::pin(async move {
            if let Err(e) = sweep_stuck_documents(store.as_ref(), stuck_processing_minutes).await {
                tracing::error!("Stuck document sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(
        "Scheduled tasks started (stuck document sweep every 5 minutes, timeout {}m)",
        stuck_processing_minutes
    );
    Ok(scheduler)
}

/// Mark documents stuck in `processing` as failed.
///
/// The guarded transition in `mark_failed` makes this safe to race with a
/// slow worker that finishes just after the sweep selects its document.
async fn sweep_stuck_documents(
    store: &dyn DocumentStatusStore,
    stuck_processing_minutes: i64,
) -> Result<()> {
    let stuck = store
        .find_stuck(Duration::minutes(stuck_processing_minutes))
        .await?;

    if stuck.is_empty() {
        return Ok(());
    }

    tracing::warn!("Found {} documents stuck in processing", stuck.len());

    for document in stuck {
        match store.mark_failed(document.id, "processing timed out").await {
            Ok(true) => tracing::info!(document_id = %document.id, "stuck document marked failed"),
            Ok(false) => {
                // Finished between the query and the update; nothing to do.
            }
            Err(e) => {
                tracing::error!(document_id = %document.id, error = %e, "failed to mark stuck document")
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use crate::domains::documents::models::document::status;
    use crate::domains::documents::Document;

    struct Row {
        status: String,
        updated_at: DateTime<Utc>,
        failure_reason: Option<String>,
    }

    /// In-memory store enforcing the same transition guard as the SQL:
    /// only `processing` rows may move to a terminal state.
    struct InMemoryDocumentStore {
        rows: Mutex<HashMap<Uuid, Row>>,
    }

    impl InMemoryDocumentStore {
        fn new() -> Self {
            Self {
                rows: Mutex::new(HashMap::new()),
            }
        }

        fn insert(&self, status: &str, age_minutes: i64) -> Uuid {
            let id = Uuid::new_v4();
            self.rows.lock().unwrap().insert(
                id,
                Row {
                    status: status.to_string(),
                    updated_at: Utc::now() - Duration::minutes(age_minutes),
                    failure_reason: None,
                },
            );
            id
        }

        fn status_of(&self, id: Uuid) -> String {
            self.rows.lock().unwrap()[&id].status.clone()
        }

        fn reason_of(&self, id: Uuid) -> Option<String> {
            self.rows.lock().unwrap()[&id].failure_reason.clone()
        }
    }

    fn document(id: Uuid, status: &str, updated_at: DateTime<Utc>) -> Document {
        Document {
            id,
            user_id: Uuid::new_v4(),
            filename: "notes.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            content: "hello".to_string(),
            blob_url: None,
            blob_id: None,
            status: status.to_string(),
            failure_reason: None,
            uploaded_at: updated_at,
            updated_at,
        }
    }

    #[async_trait]
    impl DocumentStatusStore for InMemoryDocumentStore {
        async fn find_stuck(&self, max_age: Duration) -> Result<Vec<Document>> {
            let cutoff = Utc::now() - max_age;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, row)| row.status == status::PROCESSING && row.updated_at < cutoff)
                .map(|(id, row)| document(*id, &row.status, row.updated_at))
                .collect())
        }

        async fn mark_ready(&self, id: Uuid) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(row) if row.status == status::PROCESSING => {
                    row.status = status::READY.to_string();
                    row.failure_reason = None;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(row) if row.status == status::PROCESSING => {
                    row.status = status::FAILED.to_string();
                    row.failure_reason = Some(reason.to_string());
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    #[tokio::test]
    async fn sweep_fails_only_stale_processing_documents() {
        let store = InMemoryDocumentStore::new();
        let stale = store.insert(status::PROCESSING, 45);
        let fresh = store.insert(status::PROCESSING, 5);
        let finished = store.insert(status::READY, 45);

        sweep_stuck_documents(&store, 30).await.unwrap();

        assert_eq!(store.status_of(stale), status::FAILED);
        assert_eq!(store.reason_of(stale).as_deref(), Some("processing timed out"));
        assert_eq!(store.status_of(fresh), status::PROCESSING);
        assert_eq!(store.status_of(finished), status::READY);
    }

    #[tokio::test]
    async fn terminal_states_are_never_overwritten() {
        let store = InMemoryDocumentStore::new();

        let succeeded = store.insert(status::PROCESSING, 0);
        assert!(store.mark_ready(succeeded).await.unwrap());
        assert!(!store.mark_failed(succeeded, "late sweep").await.unwrap());
        assert_eq!(store.status_of(succeeded), status::READY);
        assert_eq!(store.reason_of(succeeded), None);

        let failed = store.insert(status::PROCESSING, 0);
        assert!(store.mark_failed(failed, "bad pdf").await.unwrap());
        assert!(!store.mark_ready(failed).await.unwrap());
        assert_eq!(store.status_of(failed), status::FAILED);
        assert_eq!(store.reason_of(failed).as_deref(), Some("bad pdf"));
    }

    #[tokio::test]
    async fn sweep_tolerates_documents_finishing_mid_sweep() {
        let store = InMemoryDocumentStore::new();
        let id = store.insert(status::PROCESSING, 45);

        // The sweep's mark_failed can race a worker that finishes after
        // selection; the guard makes it a no-op instead of a clobber.
        assert!(store.mark_ready(id).await.unwrap());
        assert!(!store.mark_failed(id, "processing timed out").await.unwrap());

        sweep_stuck_documents(&store, 30).await.unwrap();
        assert_eq!(store.status_of(id), status::READY);
    }
}
