//! # scripture-rag
//!
//! Scripture grounding for persona conversations.
//!
//! Given a user's question and a persona (a biblical character, a teacher),
//! this crate finds the Bible passages most relevant to the question and
//! folds them into the instruction sent to a chat model.
//!
//! ## Architecture
//!
//! ```text
//! VerseSource ──► VerseStore ──► Chunker ──► EmbeddingProvider ──► VectorIndex
//!  (JSON files)   (load once)   (chapter    (batch embed,          (cosine,
//!                               windows)     skip failures)         copy-on-write)
//!                                                                        │
//! question ──► QueryCache / EmbeddingProvider ──► search ──► PromptBuilder ──► prompt
//! ```
//!
//! - [`VerseStore`] reads verse data once and serves range and text lookups.
//! - [`ChapterChunker`] groups consecutive verses of one chapter into chunks.
//! - [`EmbeddingProvider`] is the pluggable embedding backend
//!   ([`openai::OpenAIEmbeddingProvider`] behind the `openai` feature).
//! - [`InMemoryVectorIndex`] ranks chunks by cosine similarity.
//! - [`Retriever`] embeds queries (with a TTL cache) and searches the index.
//! - [`PromptBuilder`] renders persona, Scripture and user sections.
//! - [`ScriptureRag`] ties the pieces together for callers.
//!
//! Retrieval never blocks a conversation: a missing data file or an
//! unreachable embedding backend yields an [`Outcome::Degraded`] with no
//! passages, and the prompt is rendered without a Scripture section.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scripture_rag::{JsonFileSource, RagConfig, ScriptureRag, VerseStore};
//! use tokio_util::sync::CancellationToken;
//!
//! let rag = ScriptureRag::builder()
//!     .config(RagConfig::builder().top_k(3).min_score(0.6).build()?)
//!     .verse_store(VerseStore::new(JsonFileSource::new("data/bible/web.json")))
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! rag.initialize(&cancel).await?;
//! let prompt = rag
//!     .build_prompt("You are Peter...", "Why did you deny Jesus?", None, &cancel)
//!     .await?;
//! ```
//!
//! ## Features
//!
//! | Feature  | Enables |
//! |----------|---------|
//! | `openai` | [`openai::OpenAIEmbeddingProvider`] (also works with Ollama and other compatible servers) |
//! | `full`   | everything above |

pub mod cache;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod degrade;
pub mod document;
pub mod embedding;
pub mod error;
pub mod html_import;
pub mod inmemory;
pub mod prompt;
pub mod retriever;
pub mod service;
pub mod telemetry;
pub mod vectorstore;
pub mod verse;
pub mod verse_store;

#[cfg(feature = "openai")]
pub mod openai;

pub use cache::{CacheStats, QueryCache, normalize_query};
pub use chunking::{ChapterChunker, Chunker, build_chunks};
pub use completion::CompletionProvider;
pub use config::{RagConfig, RagConfigBuilder};
pub use degrade::{DegradeReason, Outcome};
pub use document::{Chunk, RetrievedPassage, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use html_import::HtmlImporter;
pub use inmemory::{InMemoryVectorIndex, cosine_similarity};
pub use prompt::{PromptBuilder, build_prompt};
pub use retriever::{IndexReport, Retriever, RetrieverBuilder};
pub use service::{ScriptureRag, ScriptureRagBuilder};
pub use telemetry::{LogFormat, init_tracing};
pub use vectorstore::{IndexHandle, VectorIndex};
pub use verse::{Testament, Verse, VerseKey};
pub use verse_store::{JsonDirectorySource, JsonFileSource, LoadStatus, StaticSource, VerseSource, VerseStore};

pub use tokio_util::sync::CancellationToken;
