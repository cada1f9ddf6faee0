//! Hugging Face inference embedder.
//!
//! Calls the feature-extraction pipeline for a sentence-embedding
//! model. Always asks the provider to wait for a cold model rather
//! than fail fast: the first call after an idle period may need a
//! model load, and failing it would poison whole ingestion batches.

use serde::Serialize;
use serde_json::Value;

use crate::credentials::SecretString;
use crate::error::EmbedError;
use crate::traits::ai::Embedder;

const DEFAULT_ENDPOINT: &str =
    "https://router.huggingface.co/hf-inference/models/intfloat/multilingual-e5-large/pipeline/feature-extraction";

/// Dimensionality of the default model (multilingual-e5-large).
pub const DEFAULT_DIMENSION: usize = 1024;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
    options: EmbedOptions,
}

#[derive(Debug, Serialize)]
struct EmbedOptions {
    wait_for_model: bool,
}

/// Feature-extraction client implementing [`Embedder`].
pub struct HfEmbedder {
    http: reqwest::Client,
    api_token: SecretString,
    endpoint: String,
    dimension: usize,
}

impl HfEmbedder {
    pub fn new(api_token: impl Into<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token: api_token.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Use a different model endpoint with the given output dimension.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, dimension: usize) -> Self {
        self.endpoint = endpoint.into();
        self.dimension = dimension;
        self
    }
}

/// The pipeline returns either `[f32]` or, for batched shapes,
/// `[[f32]]` with a single row. Anything else is a format error.
fn parse_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    let as_floats = |items: &[Value]| -> Option<Vec<f32>> {
        items
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    };

    match &value {
        Value::Array(items) if !items.is_empty() => {
            if let Value::Array(row) = &items[0] {
                // Requests carry a single input, so a batched reply must
                // have exactly one row. More rows means the request and
                // reply are out of step and no row can be trusted.
                if items.len() > 1 {
                    return Err(EmbedError::Format(format!(
                        "expected one embedding row, got {}",
                        items.len()
                    )));
                }
                return as_floats(row).ok_or_else(|| {
                    EmbedError::Format("nested array with non-numeric items".into())
                });
            }
            as_floats(items)
                .ok_or_else(|| EmbedError::Format("array with non-numeric items".into()))
        }
        _ => Err(EmbedError::Format(format!(
            "expected a vector, got: {}",
            summarize(&value)
        ))),
    }
}

fn summarize(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 120 {
        let preview: String = text.chars().take(120).collect();
        format!("{preview}...")
    } else {
        text
    }
}

#[async_trait::async_trait]
impl Embedder for HfEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let request = EmbedRequest {
            inputs: text,
            options: EmbedOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_token.expose())
            .json(&request)
            .send()
            .await
            .map_err(EmbedError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::Provider {
                status: status.as_u16(),
            });
        }

        let value: Value = response.json().await.map_err(EmbedError::Transport)?;
        parse_vector(value)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
