//! Deterministic mocks for testing pipeline logic without network or
//! model calls.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{EmbedError, GenerateError};
use crate::traits::ai::{CompletionModel, CompletionStream, Embedder};

/// Deterministic bag-of-words embedder.
///
/// Each word hashes to a dimension bucket, so texts sharing words get
/// cosine-similar vectors, enough signal for retrieval tests without
/// a real model. Individual texts can be made to fail, for
/// partial-failure tests.
#[derive(Clone)]
pub struct MockEmbedder {
    dimension: usize,
    fail_on: Arc<RwLock<HashSet<String>>>,
    fail_always: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_on: Arc::new(RwLock::new(HashSet::new())),
            fail_always: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Fail embedding for this exact text.
    pub fn failing_on(self, text: impl Into<String>) -> Self {
        self.fail_on.write().unwrap().insert(text.into());
        self
    }

    /// Fail every embedding call.
    pub fn failing_always(mut self) -> Self {
        self.fail_always = true;
        self
    }

    /// Number of embed calls made.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        *self.calls.lock().unwrap() += 1;

        if self.fail_always || self.fail_on.read().unwrap().contains(text) {
            return Err(EmbedError::Provider { status: 503 });
        }

        Ok(self.vector_for(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

enum MockReply {
    Text(String),
    Fragments(Vec<String>),
    Failure,
}

/// Scripted completion model.
#[derive(Clone)]
pub struct MockCompletion {
    reply: Arc<MockReply>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockCompletion {
    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Arc::new(MockReply::Text(text.into())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Stream the given fragments, in order.
    pub fn streaming(fragments: &[&str]) -> Self {
        Self {
            reply: Arc::new(MockReply::Fragments(
                fragments.iter().map(|s| s.to_string()).collect(),
            )),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every call with a provider error.
    pub fn failing() -> Self {
        Self {
            reply: Arc::new(MockReply::Failure),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The most recent prompt passed in, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    /// Number of completion calls made (streaming included).
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionModel for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &*self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fragments(fragments) => Ok(fragments.concat()),
            MockReply::Failure => Err(GenerateError::Provider { status: 500 }),
        }
    }

    async fn complete_stream(&self, prompt: &str) -> Result<CompletionStream, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &*self.reply {
            MockReply::Text(text) => {
                let text = text.clone();
                Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
            }
            MockReply::Fragments(fragments) => {
                let items: Vec<Result<String, GenerateError>> =
                    fragments.iter().cloned().map(Ok).collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            MockReply::Failure => Err(GenerateError::Provider { status: 500 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::store::cosine_similarity;

    #[tokio::test]
    async fn similar_texts_get_similar_vectors() {
        let embedder = MockEmbedder::new(64);
        let exam = embedder.embed("Exam on Friday at 10am in Room 4").await.unwrap();
        let query = embedder.embed("when is the exam").await.unwrap();
        let milk = embedder.embed("remember to buy milk").await.unwrap();

        assert!(cosine_similarity(&exam, &query) > cosine_similarity(&milk, &query));
    }

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("same text").await.unwrap();
        let b = embedder.embed("same text").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn failure_injection_targets_exact_text() {
        let embedder = MockEmbedder::new(16).failing_on("bad chunk");
        assert!(embedder.embed("bad chunk").await.is_err());
        assert!(embedder.embed("good chunk").await.is_ok());
    }
}
