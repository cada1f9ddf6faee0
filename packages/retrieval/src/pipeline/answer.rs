//! The answer engine: retrieval-augmented generation for one query.
//!
//! Retrieval errors and generation errors stay distinguishable through
//! [`PipelineError`] so clients can decide what is worth retrying.

use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::index::ChunkIndex;
use crate::pipeline::prompts::{answer_prompt, CONTEXT_SEPARATOR};
use crate::traits::ai::{CompletionModel, CompletionStream};

/// Default number of snippets retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Fixed reply when the oracle returns nothing usable.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't generate a response.";

/// A generated answer plus the literal snippets it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Query-side orchestrator: embed, retrieve, prompt, generate.
#[derive(Clone)]
pub struct AnswerEngine {
    index: ChunkIndex,
    model: Arc<dyn CompletionModel>,
    top_k: usize,
}

impl AnswerEngine {
    pub fn new(index: ChunkIndex, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            index,
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Retrieve the caller's nearest snippets and build the prompt.
    async fn retrieve(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<(String, Vec<String>), PipelineError> {
        let matches = self.index.search(user_id, query, self.top_k).await?;
        let sources: Vec<String> = matches.into_iter().map(|m| m.content).collect();

        debug!(snippets = sources.len(), "context assembled for query");

        let context = sources.join(CONTEXT_SEPARATOR);
        Ok((answer_prompt(&context, query), sources))
    }

    /// Answer `query` from the user's stored content.
    ///
    /// A blank oracle reply becomes the fixed fallback text rather
    /// than a failed request.
    pub async fn answer(&self, user_id: &str, query: &str) -> Result<Answer, PipelineError> {
        let (prompt, sources) = self.retrieve(user_id, query).await?;
        let reply = self.model.complete(&prompt).await?;

        let text = if reply.trim().is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            reply
        };

        Ok(Answer { text, sources })
    }

    /// Streaming variant: retrieval is identical, generation yields
    /// fragments as they arrive. Dropping the returned stream cancels
    /// the oracle call.
    pub async fn answer_stream(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<(Vec<String>, CompletionStream), PipelineError> {
        let (prompt, sources) = self.retrieve(user_id, query).await?;
        let stream = self.model.complete_stream(&prompt).await?;
        Ok((sources, stream))
    }
}
