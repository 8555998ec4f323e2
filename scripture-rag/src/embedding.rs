//! Embedding backend seam.
//!
//! The same provider embeds chunk text while the index is built and the
//! user's question at query time, so both land in one vector space.

use async_trait::async_trait;

use crate::error::Result;

/// Turns passage text and user questions into vectors for cosine search.
///
/// A provider may be a hosted API, a local model server or a test double.
/// Failures are reported as
/// [`RagError::EmbeddingUnavailable`](crate::RagError::EmbeddingUnavailable).
/// The index build logs and skips a chunk that fails; a failed query embedding
/// degrades retrieval to no passages.
///
/// # Example
///
/// ```rust,ignore
/// use scripture_rag::EmbeddingProvider;
///
/// let chunk = provider.embed("The LORD is my shepherd; I shall lack nothing.").await?;
/// let question = provider.embed("Who takes care of me when I'm afraid?").await?;
/// assert_eq!(chunk.len(), provider.dimensions());
/// assert_eq!(question.len(), chunk.len());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one chunk or query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several chunks at once, returning vectors in input order.
    ///
    /// The index build sends `embed_batch_size` chunks per call and falls
    /// back to [`embed`](Self::embed) per chunk when a batch fails. The
    /// default calls `embed` for each text in turn; backends with a native
    /// batch endpoint should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this provider returns. The default index is
    /// sized from it.
    fn dimensions(&self) -> usize;

    /// Name used in `provider` log fields.
    fn name(&self) -> &str {
        "embedding"
    }
}
