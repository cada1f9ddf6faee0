//! End-to-end pipeline scenarios over the in-memory store and mocks.

use std::sync::Arc;

use retrieval::stores::InMemoryVectorStore;
use retrieval::testing::{MockCompletion, MockEmbedder};
use retrieval::{AnswerEngine, ChunkIndex};
use uuid::Uuid;

fn make_index(store: Arc<InMemoryVectorStore>, chunk_words: usize) -> ChunkIndex {
    ChunkIndex::new(store, Arc::new(MockEmbedder::new(64))).with_chunk_words(chunk_words)
}

fn long_text(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn ingested_note_is_retrievable_by_meaning() {
    let store = Arc::new(InMemoryVectorStore::new());
    let index = make_index(store, 300);

    index
        .index_document(
            "user-a",
            Uuid::new_v4(),
            "Exam on Friday at 10am in Room 4, and remember to buy milk.",
        )
        .await
        .unwrap();

    let hits = index.search("user-a", "when is the exam", 5).await.unwrap();
    assert!(!hits.is_empty());
    assert!(hits[0].content.contains("Exam on Friday"));
}

#[tokio::test]
async fn chunk_counts_match_word_budget() {
    let store = Arc::new(InMemoryVectorStore::new());
    let index = make_index(store.clone(), 300);

    let doc_exact = Uuid::new_v4();
    index
        .index_document("user-a", doc_exact, &long_text(900))
        .await
        .unwrap();
    assert_eq!(store.ordinals_for(doc_exact), vec![0, 1, 2]);
    for ordinal in 0..3u32 {
        let content = store.content_at(doc_exact, ordinal).unwrap();
        assert_eq!(content.split_whitespace().count(), 300);
    }

    let doc_over = Uuid::new_v4();
    index
        .index_document("user-a", doc_over, &long_text(901))
        .await
        .unwrap();
    assert_eq!(store.ordinals_for(doc_over), vec![0, 1, 2, 3]);
    let tail = store.content_at(doc_over, 3).unwrap();
    assert_eq!(tail.split_whitespace().count(), 1);
}

#[tokio::test]
async fn near_identical_content_stays_tenant_isolated() {
    let store = Arc::new(InMemoryVectorStore::new());
    let index = make_index(store, 300);

    let doc_a = Uuid::new_v4();
    let doc_b = Uuid::new_v4();
    index
        .index_document("user-a", doc_a, "password123")
        .await
        .unwrap();
    index
        .index_document("user-b", doc_b, "password123")
        .await
        .unwrap();

    let hits = index.search("user-a", "password123", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document_id, doc_a);

    let hits = index.search("user-b", "password123", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document_id, doc_b);
}

#[tokio::test]
async fn answer_engine_grounds_the_prompt_in_retrieved_snippets() {
    let store = Arc::new(InMemoryVectorStore::new());
    let index = make_index(store, 300);

    index
        .index_document(
            "user-a",
            Uuid::new_v4(),
            "Exam on Friday at 10am in Room 4, and remember to buy milk.",
        )
        .await
        .unwrap();

    let model = MockCompletion::replying("Your exam is on Friday at 10am.");
    let engine = AnswerEngine::new(index, Arc::new(model.clone()));

    let answer = engine.answer("user-a", "when is the exam").await.unwrap();
    assert_eq!(answer.text, "Your exam is on Friday at 10am.");
    assert_eq!(answer.sources.len(), 1);

    // The oracle saw the retrieved snippet and the verbatim query.
    let prompt = model.last_prompt().unwrap();
    assert!(prompt.contains("Exam on Friday at 10am in Room 4"));
    assert!(prompt.contains("when is the exam"));
}
