//! Blob storage for original file bytes.
//!
//! The extracted text becomes the durable source of truth once a
//! document is processed; the stored blob is a disposable cache of the
//! original bytes. Callers treat every operation here as best-effort.

use async_trait::async_trait;

use crate::error::BlobError;

/// Locator for an uploaded blob.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Publicly reachable URL of the uploaded bytes.
    pub url: String,
    /// Provider-side id used for later deletion.
    pub id: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload raw bytes, returning where they live.
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredBlob, BlobError>;

    /// Delete a previously uploaded blob by provider id.
    async fn delete(&self, id: &str) -> Result<(), BlobError>;
}
