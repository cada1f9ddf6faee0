//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use retrieval::ai::{HfEmbedder, OpenAiCompletion};
use retrieval::stores::PgVectorStore;
use retrieval::{AnswerEngine, BlobStore, ChunkIndex, CompletionModel, Embedder, VectorStore};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::domains::documents::IngestService;
use crate::kernel::HttpBlobStore;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    chat_handler, chat_stream_handler, get_document, health_handler, ingest_text, list_events,
    upload_document,
};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub ingest: Arc<IngestService>,
    pub answers: AnswerEngine,
    pub blob_store: Option<Arc<dyn BlobStore>>,
    pub jwt_service: Arc<JwtService>,
}

/// Build the Axum application router
///
/// Wires the provider adapters, vector store, ingestion service, and
/// answer engine from configuration. Fails fast when the vector store
/// schema cannot be ensured.
pub async fn build_app(pool: PgPool, config: &Config) -> Result<Router> {
    let mut hf = HfEmbedder::new(config.hf_api_token.clone());
    if let Some(endpoint) = &config.hf_embedding_endpoint {
        hf = hf.with_endpoint(endpoint.clone(), config.embedding_dimension);
    }
    let embedder: Arc<dyn Embedder> = Arc::new(hf);
    let model: Arc<dyn CompletionModel> =
        Arc::new(OpenAiCompletion::new(config.openai_api_key.clone()));

    let store: Arc<dyn VectorStore> = Arc::new(PgVectorStore::new(pool.clone()));

    let index = ChunkIndex::new(store, embedder)
        .with_chunk_words(config.chunk_max_words)
        .with_embed_concurrency(config.embed_concurrency);
    index
        .bootstrap()
        .await
        .context("failed to ensure vector store schema")?;

    let answers = AnswerEngine::new(index.clone(), Arc::clone(&model)).with_top_k(config.answer_top_k);

    let blob_store: Option<Arc<dyn BlobStore>> = config.blob_store_url.as_ref().map(|url| {
        let token = config.blob_store_token.clone().map(Into::into);
        Arc::new(HttpBlobStore::new(url.clone(), token)) as Arc<dyn BlobStore>
    });

    let ingest = Arc::new(IngestService::new(
        pool.clone(),
        index,
        model,
        blob_store.clone(),
        config.event_confidence_threshold,
    ));

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let app_state = AppState {
        db_pool: pool,
        ingest,
        answers,
        blob_store,
        jwt_service: jwt_service.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let jwt_service_for_middleware = jwt_service.clone();

    let app = Router::new()
        .route("/api/documents", post(upload_document))
        .route("/api/documents/text", post(ingest_text))
        .route("/api/documents/:id", get(get_document))
        .route("/api/events", get(list_events))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
