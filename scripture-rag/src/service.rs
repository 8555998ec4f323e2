//! Caller-facing entry point.
//!
//! [`ScriptureRag`] wires the verse store, chunker and retriever together and
//! exposes the operations a chat session needs: initialize once, retrieve
//! passages for a question, and assemble (or complete) a persona prompt.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scripture_rag::{JsonFileSource, RagConfig, ScriptureRag, VerseStore};
//! use tokio_util::sync::CancellationToken;
//!
//! let rag = ScriptureRag::builder()
//!     .config(RagConfig::default())
//!     .verse_store(VerseStore::new(JsonFileSource::new("data/bible/web.json")))
//!     .embedding_provider(Arc::new(embedder))
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! rag.initialize(&cancel).await?;
//! let prompt = rag.build_prompt(persona, "Why did you deny Jesus?", None, &cancel).await?;
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chunking::{ChapterChunker, Chunker};
use crate::completion::CompletionProvider;
use crate::config::RagConfig;
use crate::degrade::{DegradeReason, Outcome};
use crate::document::RetrievedPassage;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::prompt::PromptBuilder;
use crate::retriever::{IndexReport, Retriever, cancellable};
use crate::verse_store::{LoadStatus, VerseStore};

/// Scripture grounding for persona conversations.
///
/// The index is built by [`initialize`](Self::initialize) and is read-only
/// afterwards; [`rebuild`](Self::rebuild) prepares a replacement and swaps it
/// in without disturbing concurrent queries. Until initialization completes,
/// retrieval degrades to an empty result.
pub struct ScriptureRag {
    verses: Arc<VerseStore>,
    chunker: Arc<dyn Chunker>,
    retriever: Retriever,
    initialized: OnceCell<Outcome<IndexReport>>,
    build_lock: Mutex<()>,
}

impl ScriptureRag {
    /// Create a new [`ScriptureRagBuilder`].
    pub fn builder() -> ScriptureRagBuilder {
        ScriptureRagBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        self.retriever.config()
    }

    pub fn verses(&self) -> &VerseStore {
        &self.verses
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Returns `true` once [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Load verses, chunk them and build the index. Runs at most once;
    /// later calls return the first result.
    ///
    /// Missing verse data or an embedding backend that rejects every chunk
    /// produce a degraded outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] if `cancel` fires. A cancelled
    /// initialization can be retried.
    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<Outcome<IndexReport>> {
        self.initialized.get_or_try_init(|| self.build(cancel)).await.cloned()
    }

    /// Re-chunk the cached verses and replace the index.
    ///
    /// Queries running during the rebuild keep searching the previous index.
    /// Builds run one at a time; a rebuild started while another build is in
    /// flight waits for it and then replaces its result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] if `cancel` fires; the previous index
    /// stays in place.
    pub async fn rebuild(&self, cancel: &CancellationToken) -> Result<Outcome<IndexReport>> {
        self.build(cancel).await
    }

    async fn build(&self, cancel: &CancellationToken) -> Result<Outcome<IndexReport>> {
        let _guard = cancellable(cancel, self.build_lock.lock()).await?;
        let verses = cancellable(cancel, self.verses.load_all()).await?;
        if verses.is_empty() {
            let message = match self.verses.load_status() {
                LoadStatus::Degraded(message) => message,
                _ => "verse source is empty".to_string(),
            };
            warn!(reason = %message, "no verses available, scripture grounding disabled");
            return Ok(Outcome::fallback(DegradeReason::DataUnavailable(message)));
        }

        let chunks = self.chunker.chunk(&verses);
        let report = self.retriever.build_index(&chunks, cancel).await?;
        info!(
            verse_count = verses.len(),
            chunk_count = chunks.len(),
            indexed = report.indexed,
            skipped = report.skipped,
            "scripture grounding ready"
        );

        if report.indexed == 0 && !chunks.is_empty() {
            return Ok(Outcome::degraded(
                report,
                DegradeReason::EmbeddingUnavailable("no chunk could be embedded".to_string()),
            ));
        }
        Ok(Outcome::Ok(report))
    }

    /// Passages relevant to `query`, most relevant first.
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
    ) -> Result<Outcome<Vec<RetrievedPassage>>> {
        let outcome = self.retriever.retrieve_chunks(query, top_k, min_score, cancel).await?;
        Ok(outcome.map(|chunks| chunks.iter().map(RetrievedPassage::from).collect()))
    }

    /// Assemble the prompt for `persona` answering `query`, using the
    /// configured `top_k` and `min_score`.
    ///
    /// When retrieval degrades the prompt simply has no Scripture section.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] if `cancel` fires.
    pub async fn build_prompt(
        &self,
        persona: &str,
        query: &str,
        user_context: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let config = self.retriever.config();
        let chunks = self
            .retriever
            .retrieve_chunks(query, config.top_k, config.min_score, cancel)
            .await?
            .into_inner();

        let mut builder = PromptBuilder::new(persona).scripture_chunks(&chunks);
        if let Some(context) = user_context {
            builder = builder.user_context(context);
        }
        Ok(builder.render())
    }

    /// Build the prompt and hand it to `completion`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] if `cancel` fires, or the completion
    /// provider's error.
    pub async fn converse(
        &self,
        completion: &dyn CompletionProvider,
        persona: &str,
        query: &str,
        user_context: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let prompt = self.build_prompt(persona, query, user_context, cancel).await?;
        cancellable(cancel, completion.complete(&prompt)).await?.inspect_err(|e| {
            warn!(provider = completion.name(), error = %e, "completion failed");
        })
    }
}

/// Builder for constructing a [`ScriptureRag`].
///
/// The verse store and embedding provider are required. The chunker defaults
/// to a [`ChapterChunker`] using the configured `chunk_size`.
#[derive(Default)]
pub struct ScriptureRagBuilder {
    config: Option<RagConfig>,
    verses: Option<Arc<VerseStore>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl ScriptureRagBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn verse_store(mut self, store: VerseStore) -> Self {
        self.verses = Some(Arc::new(store));
        self
    }

    /// Share a verse store with other components (e.g. a reading view).
    pub fn shared_verse_store(mut self, store: Arc<VerseStore>) -> Self {
        self.verses = Some(store);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`ScriptureRag`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// config fails validation.
    pub fn build(self) -> Result<ScriptureRag> {
        let config = self.config.unwrap_or_default();
        let verses =
            self.verses.ok_or_else(|| RagError::Config("verse_store is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(ChapterChunker::new(config.chunk_size)));
        let retriever =
            Retriever::builder().config(config).embedding_provider(embedding_provider).build()?;

        Ok(ScriptureRag {
            verses,
            chunker,
            retriever,
            initialized: OnceCell::new(),
            build_lock: Mutex::new(()),
        })
    }
}
