//! HTTP blob store adapter.
//!
//! Original uploads are parked in an external blob service only until
//! ingestion commits; after that the extracted text in Postgres is the
//! source of truth and the blob is deleted.

use async_trait::async_trait;
use retrieval::{BlobError, BlobStore, SecretString, StoredBlob};
use serde::Deserialize;

pub struct HttpBlobStore {
    http: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    id: String,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>, token: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredBlob, BlobError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.http.post(format!("{}/files", self.base_url)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BlobError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BlobError::Upload(format!(
                "blob service returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Upload(e.to_string()))?;

        Ok(StoredBlob {
            url: body.url,
            id: body.id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), BlobError> {
        let response = self
            .authorize(self.http.delete(format!("{}/files/{}", self.base_url, id)))
            .send()
            .await
            .map_err(|e| BlobError::Delete(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BlobError::Delete(format!(
                "blob service returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
