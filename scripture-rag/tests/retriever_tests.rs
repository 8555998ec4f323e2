//! Retrieval behaviour: ranking, caching, degradation and cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{KeywordEmbedder, john_and_unrelated};
use scripture_rag::{
    CancellationToken, Chunk, DegradeReason, EmbeddingProvider, InMemoryVectorIndex, IndexHandle,
    RagConfig, RagError, Result, Retriever, Verse, VectorIndex, build_chunks, build_prompt,
    prompt::SCRIPTURE_HEADING,
};

const PERSONA: &str = "You are John, the beloved disciple.";

fn retriever(embedder: Arc<KeywordEmbedder>) -> Retriever {
    let config = RagConfig::builder().chunk_size(1).build().unwrap();
    Retriever::builder().config(config).embedding_provider(embedder).build().unwrap()
}

async fn indexed_retriever(embedder: Arc<KeywordEmbedder>) -> (Retriever, Vec<Chunk>) {
    let retriever = retriever(embedder);
    let chunks = build_chunks(&john_and_unrelated(), 1);
    retriever.build_index(&chunks, &CancellationToken::new()).await.unwrap();
    (retriever, chunks)
}

#[tokio::test]
async fn top_match_is_the_related_verse() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, chunks) = indexed_retriever(embedder).await;
    assert_eq!(chunks.len(), 11);

    let outcome = retriever
        .retrieve("God so loved the world", 1, 0.6, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.is_degraded());
    let results = outcome.into_inner();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.reference(), "John 3:16");
    assert!(results[0].score > 0.99);
}

#[tokio::test]
async fn failing_embedder_yields_empty_result_and_plain_prompt() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, _) = indexed_retriever(embedder.clone()).await;
    embedder.fail_all();

    let outcome = retriever.retrieve_chunks("love", 3, 0.6, &CancellationToken::new()).await.unwrap();
    assert!(matches!(outcome.reason(), Some(DegradeReason::EmbeddingUnavailable(_))));

    let chunks = outcome.into_inner();
    assert!(chunks.is_empty());

    let prompt = build_prompt(PERSONA, &chunks, None);
    assert!(prompt.contains(PERSONA));
    assert!(!prompt.contains(SCRIPTURE_HEADING));
}

#[tokio::test]
async fn embedder_failing_during_build_leaves_index_empty() {
    let embedder = Arc::new(KeywordEmbedder::new());
    embedder.fail_all();
    let retriever = retriever(embedder.clone());

    let report = retriever
        .build_index(&build_chunks(&john_and_unrelated(), 1), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.indexed, 0);
    assert_eq!(report.skipped, 11);

    let calls = embedder.calls();
    let outcome = retriever.retrieve("love", 3, 0.6, &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.reason(), Some(&DegradeReason::IndexEmpty));
    assert!(outcome.value().is_empty());
    assert_eq!(embedder.calls(), calls, "empty index must not call the embedder");
}

#[tokio::test]
async fn repeated_query_hits_cache() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, _) = indexed_retriever(embedder.clone()).await;
    let cancel = CancellationToken::new();

    let first = retriever.retrieve("God so loved the world", 3, 0.6, &cancel).await.unwrap();
    let calls_after_first = embedder.calls();
    let second = retriever.retrieve("  god so LOVED the world ", 3, 0.6, &cancel).await.unwrap();

    assert_eq!(embedder.calls(), calls_after_first);
    assert_eq!(embedder.calls_for("God so loved the world"), 1);
    assert_eq!(first.value().len(), second.value().len());
    assert_eq!(retriever.cache().stats().hits, 1);
}

#[tokio::test(start_paused = true)]
async fn cached_embedding_expires_after_ttl() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let config = RagConfig::builder().cache_ttl(Duration::from_secs(60)).build().unwrap();
    let retriever =
        Retriever::builder().config(config).embedding_provider(embedder.clone()).build().unwrap();
    let cancel = CancellationToken::new();
    retriever.build_index(&build_chunks(&john_and_unrelated(), 1), &cancel).await.unwrap();

    retriever.retrieve("the light", 3, 0.6, &cancel).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    retriever.retrieve("the light", 3, 0.6, &cancel).await.unwrap();

    assert_eq!(embedder.calls_for("the light"), 2);
}

/// Embeds from a fixed table; unknown texts fail.
struct TableEmbedder(Vec<(&'static str, Vec<f32>)>);

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.0
            .iter()
            .find(|(t, _)| *t == text)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RagError::embedding("table", format!("no vector for {text:?}")))
    }

    fn dimensions(&self) -> usize {
        2
    }
}

#[tokio::test]
async fn threshold_above_best_score_returns_nothing() {
    let verse = Verse::new("Psalms", 46, 10, "Be still, and know that I am God.", "WEB");
    let side = (1.0f32 - 0.85 * 0.85).sqrt();
    let embedder = TableEmbedder(vec![
        ("Be still, and know that I am God.", vec![0.85, side]),
        ("stillness", vec![1.0, 0.0]),
    ]);
    let retriever = Retriever::builder().embedding_provider(Arc::new(embedder)).build().unwrap();
    let cancel = CancellationToken::new();
    retriever.build_index(&build_chunks(&[verse], 3), &cancel).await.unwrap();

    let strict = retriever.retrieve("stillness", 3, 0.9, &cancel).await.unwrap();
    assert!(!strict.is_degraded());
    assert!(strict.value().is_empty());

    let loose = retriever.retrieve("stillness", 3, 0.8, &cancel).await.unwrap();
    assert_eq!(loose.value().len(), 1);
    assert!((loose.value()[0].score - 0.85).abs() < 1e-4);
}

#[tokio::test]
async fn blank_query_is_empty_without_embedding() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, _) = indexed_retriever(embedder.clone()).await;
    let calls = embedder.calls();

    let outcome = retriever.retrieve("   ", 3, 0.6, &CancellationToken::new()).await.unwrap();
    assert!(!outcome.is_degraded());
    assert!(outcome.value().is_empty());
    assert_eq!(embedder.calls(), calls);
}

#[tokio::test]
async fn build_skips_chunks_that_fail_to_embed() {
    let embedder = Arc::new(KeywordEmbedder::poisoned("sluggard"));
    let (retriever, chunks) = indexed_retriever(embedder).await;

    let index = retriever.index().snapshot().await;
    assert_eq!(index.len(), chunks.len() - 1);

    let outcome = retriever
        .retrieve("God so loved the world", 1, 0.6, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.value()[0].chunk.book, "John");
}

#[tokio::test]
async fn cancelled_token_is_reported() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, _) = indexed_retriever(embedder).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = retriever.retrieve("light", 3, 0.6, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_hanging_embedding() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, _) = indexed_retriever(embedder.clone()).await;
    embedder.hang_all();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = retriever.retrieve("bread", 3, 0.6, &cancel).await.unwrap_err();
    assert!(matches!(err, RagError::Cancelled));
}

#[tokio::test]
async fn cancelled_rebuild_keeps_previous_index() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let (retriever, chunks) = indexed_retriever(embedder).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let extra = build_chunks(&[Verse::new("Luke", 2, 7, "There was no room in the inn.", "WEB")], 1);
    let err = retriever.build_index(&extra, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());

    assert_eq!(retriever.index().snapshot().await.len(), chunks.len());
}

#[tokio::test]
async fn readers_keep_their_snapshot_across_replace() {
    let handle = IndexHandle::new(InMemoryVectorIndex::new(2));
    let mut next = InMemoryVectorIndex::new(2);
    next.add(build_chunks(&[Verse::new("John", 11, 35, "Jesus wept.", "WEB")], 1)[0].clone(), vec![1.0, 0.0])
        .unwrap();

    let before = handle.snapshot().await;
    let previous = handle.replace(Arc::new(next)).await;

    assert!(before.is_empty());
    assert!(previous.is_empty());
    assert_eq!(handle.snapshot().await.len(), 1);
}

#[tokio::test]
async fn query_of_wrong_dimension_degrades() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let chunk = build_chunks(&[Verse::new("Genesis", 1, 3, "Then there was light.", "WEB")], 1);
    let mut index = InMemoryVectorIndex::new(3);
    index.add(chunk[0].clone(), vec![0.0, 1.0, 0.0]).unwrap();

    let retriever = Retriever::builder()
        .embedding_provider(embedder)
        .index(IndexHandle::new(index))
        .build()
        .unwrap();

    let outcome = retriever.retrieve("light", 3, 0.0, &CancellationToken::new()).await.unwrap();
    assert!(matches!(outcome.reason(), Some(DegradeReason::IndexUnavailable(_))));
    assert!(outcome.value().is_empty());
}
