//! Deterministic word-window chunking.
//!
//! Chunk identity in the vector store is a function of
//! `(document_id, ordinal)`, so re-ingesting the same text with the
//! same chunk size must reproduce the same ordinal-to-text mapping.
//! That only holds because this split is a pure function of its input.

/// Split `text` into chunks of at most `max_words` whitespace-delimited
/// words, preserving word order. Never splits mid-word.
///
/// Produces `ceil(word_count / max_words)` chunks; the final chunk may
/// be shorter. Empty or whitespace-only input yields an empty vec.
/// A `max_words` of zero is treated as one word per chunk.
pub fn chunk_words(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    words
        .chunks(max_words)
        .map(|window| window.join(" "))
        .collect()
}
