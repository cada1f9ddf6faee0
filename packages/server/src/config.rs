use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub hf_api_token: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub blob_store_url: Option<String>,
    pub blob_store_token: Option<String>,
    pub hf_embedding_endpoint: Option<String>,
    pub chunk_max_words: usize,
    pub answer_top_k: usize,
    pub event_confidence_threshold: f32,
    pub embedding_dimension: usize,
    pub embed_concurrency: usize,
    pub stuck_processing_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            hf_api_token: env::var("HF_API_TOKEN").context("HF_API_TOKEN must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "document-qa".to_string()),
            blob_store_url: env::var("BLOB_STORE_URL").ok(),
            blob_store_token: env::var("BLOB_STORE_TOKEN").ok(),
            hf_embedding_endpoint: env::var("HF_EMBEDDING_ENDPOINT").ok(),
            chunk_max_words: env::var("CHUNK_MAX_WORDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("CHUNK_MAX_WORDS must be a valid number")?,
            answer_top_k: env::var("ANSWER_TOP_K")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("ANSWER_TOP_K must be a valid number")?,
            event_confidence_threshold: env::var("EVENT_CONFIDENCE_THRESHOLD")
                .unwrap_or_else(|_| "0.6".to_string())
                .parse()
                .context("EVENT_CONFIDENCE_THRESHOLD must be a valid number")?,
            embedding_dimension: env::var("EMBEDDING_DIMENSION")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .context("EMBEDDING_DIMENSION must be a valid number")?,
            embed_concurrency: env::var("EMBED_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("EMBED_CONCURRENCY must be a valid number")?,
            stuck_processing_minutes: env::var("STUCK_PROCESSING_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("STUCK_PROCESSING_MINUTES must be a valid number")?,
        })
    }
}
