//! Provider adapters for the oracle traits.
//!
//! - [`openai`] - chat-completions client implementing [`crate::CompletionModel`]
//! - [`embedding`] - Hugging Face feature-extraction client implementing [`crate::Embedder`]
//! - [`streaming`] - SSE parsing shared by the streaming completion path

pub mod embedding;
pub mod openai;
pub mod streaming;

pub use embedding::HfEmbedder;
pub use openai::OpenAiCompletion;
