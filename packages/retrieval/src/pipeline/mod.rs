//! Pipeline orchestrators.
//!
//! - [`index`] - ingestion side: chunk, embed, upsert
//! - [`answer`] - query side: retrieve, prompt, generate
//! - [`prompts`] - prompt text shared by both

pub mod answer;
pub mod index;
pub mod prompts;
