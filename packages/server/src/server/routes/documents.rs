//! Document ingestion and status endpoints.
//!
//! Extraction runs inline so a broken upload fails fast with 4xx; the
//! expensive chunk/embed/index work runs in the background while the
//! client polls `GET /api/documents/{id}` for the status transition.

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    Json,
};
use retrieval::extract::extract_pdf_text;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::domains::documents::Document;
use crate::domains::events::DetectedEvent;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub document: Document,
    pub detected_events: Vec<DetectedEvent>,
}

#[derive(Debug, Deserialize)]
pub struct IngestTextRequest {
    pub content: String,
    pub filename: Option<String>,
}

/// POST /api/documents - upload a PDF for ingestion
pub async fn upload_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("invalid_multipart", e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .unwrap_or("document.pdf")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request("invalid_multipart", e.to_string()))?;
            file = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) = file
        .ok_or_else(|| ApiError::bad_request("missing_file", "multipart field 'file' is required"))?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request(
            "invalid_file",
            "only PDF uploads are supported",
        ));
    }

    // Extraction is CPU-bound, keep it off the async workers.
    let (bytes, extracted) = tokio::task::spawn_blocking(move || {
        let result = extract_pdf_text(&bytes);
        (bytes, result)
    })
    .await
    .map_err(|e| ApiError::internal(format!("extraction task failed: {e}")))?;
    let content = extracted?;

    // Park the original in the blob store until ingestion commits.
    // Best-effort: a blob failure never blocks ingestion since the
    // extracted text is already in hand.
    let mut blob_url = None;
    let mut blob_id = None;
    if let Some(blob_store) = &state.blob_store {
        match blob_store.upload(bytes, &filename).await {
            Ok(blob) => {
                blob_url = Some(blob.url);
                blob_id = Some(blob.id);
            }
            Err(e) => warn!(error = %e, "blob upload failed, continuing without blob"),
        }
    }

    let document = Document::create(
        user.user_id,
        &filename,
        "pdf",
        &content,
        blob_url.as_deref(),
        blob_id.as_deref(),
        &state.db_pool,
    )
    .await?;

    let detected_events = state
        .ingest
        .detect_and_persist_events(user.user_id, document.id, &content)
        .await;

    state.ingest.spawn_processing(document.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            document,
            detected_events,
        }),
    ))
}

/// POST /api/documents/text - ingest raw text directly
pub async fn ingest_text(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(request): Json<IngestTextRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::bad_request(
            "empty_document",
            "content must not be blank",
        ));
    }

    let filename = request.filename.unwrap_or_else(|| {
        format!("Quick Note {}", chrono::Utc::now().format("%Y-%m-%d %H:%M"))
    });

    let document = Document::create(
        user.user_id,
        &filename,
        "text",
        &request.content,
        None,
        None,
        &state.db_pool,
    )
    .await?;

    let detected_events = state
        .ingest
        .detect_and_persist_events(user.user_id, document.id, &request.content)
        .await;

    state.ingest.spawn_processing(document.clone());

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            document,
            detected_events,
        }),
    ))
}

/// GET /api/documents/:id - fetch a document's status
///
/// Scoped to the authenticated user; someone else's document id reads as
/// 404, not 403, so ids cannot be probed.
pub async fn get_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    let document = Document::find_for_user(id, user.user_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("document not found"))?;

    Ok(Json(document))
}
