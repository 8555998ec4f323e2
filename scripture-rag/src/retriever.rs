//! Query-time retrieval and index building.
//!
//! The [`Retriever`] composes an [`EmbeddingProvider`], the shared
//! [`IndexHandle`] and a [`QueryCache`]:
//!
//! - [`build_index`](Retriever::build_index): embed chunks → fill a fresh
//!   index → swap it in. Chunks that fail to embed are logged and omitted.
//! - [`retrieve`](Retriever::retrieve): embed the query (or hit the cache) →
//!   search the current index. Failures degrade to an empty result.
//!
//! Only cancellation is reported as an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use scripture_rag::{Retriever, RagConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let retriever = Retriever::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! retriever.build_index(&chunks, &cancel).await?;
//! let passages = retriever.retrieve("God so loved the world", 3, 0.6, &cancel).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::QueryCache;
use crate::config::RagConfig;
use crate::degrade::{DegradeReason, Outcome};
use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorIndex;
use crate::vectorstore::{IndexHandle, VectorIndex};

/// Run `future` unless `cancel` fires first.
///
/// Cancellation drops the future, which aborts any in-flight request it owns.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RagError::Cancelled),
        output = future => Ok(output),
    }
}

/// Counts from an index build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Chunks stored in the new index.
    pub indexed: usize,
    /// Chunks omitted because embedding them failed.
    pub skipped: usize,
}

/// Embeds queries and searches the current Scripture index.
///
/// Construct one via [`Retriever::builder()`].
pub struct Retriever {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: IndexHandle,
    cache: QueryCache,
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// The shared index handle.
    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Embed `chunks` and publish them as the new index.
    ///
    /// Chunks are embedded in batches of `embed_batch_size`. When a batch
    /// fails, its chunks are retried one at a time; a chunk that still fails
    /// (or comes back with the wrong dimensionality) is logged and left out.
    /// The previous index stays in place until the new one is complete.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] if `cancel` fires; nothing is published.
    pub async fn build_index(
        &self,
        chunks: &[Chunk],
        cancel: &CancellationToken,
    ) -> Result<IndexReport> {
        let provider = self.embedding_provider.name().to_string();
        let mut index = InMemoryVectorIndex::new(self.embedding_provider.dimensions());
        let mut skipped = 0;

        for batch in chunks.chunks(self.config.embed_batch_size) {
            if cancel.is_cancelled() {
                info!(provider = %provider, "index build cancelled");
                return Err(RagError::Cancelled);
            }

            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings: Vec<Option<Vec<f32>>> =
                match cancellable(cancel, self.embedding_provider.embed_batch(&texts)).await? {
                    Ok(embeddings) if embeddings.len() == batch.len() => {
                        embeddings.into_iter().map(Some).collect()
                    }
                    Ok(embeddings) => {
                        warn!(
                            provider = %provider,
                            expected = batch.len(),
                            actual = embeddings.len(),
                            "batch returned wrong number of embeddings, retrying per chunk"
                        );
                        self.embed_each(batch, cancel).await?
                    }
                    Err(e) => {
                        warn!(provider = %provider, error = %e, batch_size = batch.len(), "batch embedding failed, retrying per chunk");
                        self.embed_each(batch, cancel).await?
                    }
                };

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                let Some(embedding) = embedding else {
                    skipped += 1;
                    continue;
                };
                if let Err(e) = index.add(chunk.clone(), embedding) {
                    warn!(chunk.id = %chunk.id, error = %e, "omitting chunk from index");
                    skipped += 1;
                }
            }
        }

        let report = IndexReport { indexed: index.len(), skipped };
        self.index.replace(Arc::new(index)).await;
        info!(indexed = report.indexed, skipped = report.skipped, "built scripture index");
        Ok(report)
    }

    async fn embed_each(
        &self,
        batch: &[Chunk],
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<Vec<f32>>>> {
        let mut embeddings = Vec::with_capacity(batch.len());
        for chunk in batch {
            match cancellable(cancel, self.embedding_provider.embed(&chunk.text)).await? {
                Ok(embedding) => embeddings.push(Some(embedding)),
                Err(e) => {
                    warn!(chunk.id = %chunk.id, error = %e, "embedding failed, omitting chunk");
                    embeddings.push(None);
                }
            }
        }
        Ok(embeddings)
    }

    /// Find the passages most similar to `query`.
    ///
    /// Returns at most `top_k` results scoring at least `min_score`, most
    /// relevant first. An empty index, a failed embedding call, or an index
    /// error yields [`Outcome::Degraded`] with no results. A blank query
    /// yields an empty [`Outcome::Ok`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] if `cancel` fires.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
        cancel: &CancellationToken,
    ) -> Result<Outcome<Vec<SearchResult>>> {
        if cancel.is_cancelled() {
            return Err(RagError::Cancelled);
        }
        let query = query.trim();
        if query.is_empty() {
            return Ok(Outcome::Ok(Vec::new()));
        }

        let index = self.index.snapshot().await;
        if index.is_empty() {
            debug!("scripture index is empty, skipping retrieval");
            return Ok(Outcome::fallback(DegradeReason::IndexEmpty));
        }

        let embedding = match self.cache.get(query).await {
            Some(embedding) => {
                debug!("query embedding cache hit");
                embedding
            }
            None => match cancellable(cancel, self.embedding_provider.embed(query)).await? {
                Ok(embedding) => {
                    let embedding: Arc<[f32]> = embedding.into();
                    if embedding.len() == index.dimensions() {
                        self.cache.insert(query, embedding.clone()).await;
                    }
                    embedding
                }
                Err(e) => {
                    warn!(error = %e, "query embedding failed, continuing without scripture");
                    return Ok(Outcome::fallback(DegradeReason::EmbeddingUnavailable(
                        e.to_string(),
                    )));
                }
            },
        };

        match index.search(&embedding, top_k, min_score) {
            Ok(results) => {
                info!(result_count = results.len(), top_k, min_score, "retrieval completed");
                Ok(Outcome::Ok(results))
            }
            Err(e) => {
                warn!(error = %e, "index search failed, continuing without scripture");
                Ok(Outcome::fallback(DegradeReason::IndexUnavailable(e.to_string())))
            }
        }
    }

    /// Like [`retrieve`](Self::retrieve), dropping the scores.
    pub async fn retrieve_chunks(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
        cancel: &CancellationToken,
    ) -> Result<Outcome<Vec<Chunk>>> {
        let outcome = self.retrieve(query, top_k, min_score, cancel).await?;
        Ok(outcome.map(|results| results.into_iter().map(|r| r.chunk).collect()))
    }
}

/// Builder for constructing a [`Retriever`].
///
/// Only the embedding provider is required. Without a config the defaults
/// are used; without an index handle an empty in-memory index sized to the
/// provider's dimensionality is created.
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<IndexHandle>,
}

impl RetrieverBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Share an existing index handle instead of creating a new one.
    pub fn index(mut self, index: IndexHandle) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`Retriever`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the embedding provider is missing or
    /// the config fails validation.
    pub fn build(self) -> Result<Retriever> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let index = self.index.unwrap_or_else(|| {
            IndexHandle::new(InMemoryVectorIndex::new(embedding_provider.dimensions()))
        });
        let cache = QueryCache::new(config.cache_capacity, config.cache_ttl());

        Ok(Retriever { config, embedding_provider, index, cache })
    }
}
