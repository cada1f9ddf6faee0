//! Completion oracle over the OpenAI chat-completions REST API.
//!
//! A plain `reqwest` client, no SDK: the pipeline needs exactly two
//! operations (complete, stream) and the raw API keeps the dependency
//! surface small.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::streaming::DeltaStream;
use crate::credentials::SecretString;
use crate::error::GenerateError;
use crate::traits::ai::{CompletionModel, CompletionStream};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client implementing [`CompletionModel`].
pub struct OpenAiCompletion {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different API host (proxies, compatible providers,
    /// mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send(
        &self,
        prompt: &str,
        stream: bool,
    ) -> Result<reqwest::Response, GenerateError> {
        let body = json!({
            "model": self.model,
            "messages": [Message { role: "user", content: prompt }],
            "stream": stream,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(GenerateError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Provider {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl CompletionModel for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        tracing::debug!(prompt_len = prompt.len(), model = %self.model, "completion request");

        let response = self.send(prompt, false).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(GenerateError::Transport)?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn complete_stream(&self, prompt: &str) -> Result<CompletionStream, GenerateError> {
        tracing::debug!(prompt_len = prompt.len(), model = %self.model, "streaming completion request");

        let response = self.send(prompt, true).await?;

        Ok(Box::pin(DeltaStream::new(response.bytes_stream())))
    }
}
