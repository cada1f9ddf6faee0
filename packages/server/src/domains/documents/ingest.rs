//! Document ingestion orchestration.
//!
//! Event detection runs synchronously so the upload response can carry the
//! detected events; chunking, embedding, and indexing run in a background
//! task that owns the document's status transition. Work for the same
//! document id is serialized through a per-document async mutex so a
//! re-upload cannot interleave with an in-flight indexing run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use retrieval::events::{detect_events, EventDraft};
use retrieval::{BlobStore, ChunkIndex, CompletionModel};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domains::documents::Document;
use crate::domains::events::DetectedEvent;

pub struct IngestService {
    pool: PgPool,
    index: ChunkIndex,
    model: Arc<dyn CompletionModel>,
    blob_store: Option<Arc<dyn BlobStore>>,
    confidence_threshold: f32,
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl IngestService {
    pub fn new(
        pool: PgPool,
        index: ChunkIndex,
        model: Arc<dyn CompletionModel>,
        blob_store: Option<Arc<dyn BlobStore>>,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            pool,
            index,
            model,
            blob_store,
            confidence_threshold,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Detect calendar events in `text` and persist those above the
    /// confidence threshold.
    ///
    /// Detection is best-effort: an oracle failure or malformed reply is
    /// logged and yields an empty list, never a failed ingestion.
    pub async fn detect_and_persist_events(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        text: &str,
    ) -> Vec<DetectedEvent> {
        let drafts: Vec<EventDraft> = match detect_events(self.model.as_ref(), text).await {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(%document_id, error = %e, "event detection failed, continuing without events");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        for draft in drafts {
            if draft.confidence < self.confidence_threshold {
                continue;
            }
            match DetectedEvent::create(user_id, document_id, &draft, &self.pool).await {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(%document_id, error = %e, "failed to persist detected event, skipping")
                }
            }
        }

        events
    }

    /// Kick off background indexing for a freshly created document.
    ///
    /// Returns immediately; the spawned task drives the document from
    /// `processing` to `ready` or `failed`.
    pub fn spawn_processing(self: &Arc<Self>, document: Document) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let document_id = document.id;
            let lock = service.lock_for(document_id);
            let _guard = lock.lock().await;

            service.process(document).await;
            service.release_lock(document_id);
        });
    }

    async fn process(&self, document: Document) {
        let document_id = document.id;
        let user_key = document.user_id.to_string();

        let outcome = self
            .index
            .index_document(&user_key, document_id, &document.content)
            .await;

        match outcome {
            Ok(outcome) => {
                info!(
                    %document_id,
                    chunks_indexed = outcome.chunks_indexed,
                    chunks_skipped = outcome.chunks_skipped,
                    "document indexed"
                );
                match Document::mark_ready(document_id, &self.pool).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(%document_id, "document already in a terminal state, skipping ready transition")
                    }
                    Err(e) => error!(%document_id, error = %e, "failed to mark document ready"),
                }
            }
            Err(e) => {
                warn!(%document_id, error = %e, "indexing failed");
                match Document::mark_failed(document_id, &e.to_string(), &self.pool).await {
                    Ok(_) => {}
                    Err(e) => error!(%document_id, error = %e, "failed to mark document failed"),
                }
            }
        }

        // Blob cleanup happens only after the status transition is durable.
        // The extracted content column is the source of truth from here on.
        if let (Some(blob_store), Some(blob_id)) = (&self.blob_store, &document.blob_id) {
            match blob_store.delete(blob_id).await {
                Ok(()) => {
                    if let Err(e) = Document::clear_blob(document_id, &self.pool).await {
                        warn!(%document_id, error = %e, "failed to clear blob locator");
                    }
                }
                Err(e) => warn!(%document_id, error = %e, "failed to delete blob, locator kept"),
            }
        }
    }

    fn lock_for(&self, document_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry(document_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    fn release_lock(&self, document_id: Uuid) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Drop the entry only when no other task holds a clone; a queued
        // re-upload for the same id keeps the mutex alive.
        if let Some(lock) = locks.get(&document_id) {
            if Arc::strong_count(lock) <= 2 {
                locks.remove(&document_id);
            }
        }
    }
}
