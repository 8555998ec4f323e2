//! Vector index trait and the copy-on-write handle used at query time.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A similarity index over chunk embeddings.
///
/// The index is filled once during initialization and only read afterwards.
/// [`InMemoryVectorIndex`](crate::InMemoryVectorIndex) scans linearly, which
/// is fine for a few thousand chunks; a larger corpus would swap in an
/// approximate nearest-neighbour implementation behind this same trait.
///
/// # Example
///
/// ```rust,ignore
/// use scripture_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let mut index = InMemoryVectorIndex::new(768);
/// index.add(chunk, embedding)?;
/// let results = index.search(&query_embedding, 3, 0.6)?;
/// ```
pub trait VectorIndex: Send + Sync {
    /// Insert the entry for `chunk.id`, replacing any existing entry.
    fn add(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()>;

    /// Return at most `top_k` entries scoring at least `min_score`, ordered
    /// by descending similarity. Equal scores keep insertion order.
    fn search(&self, query: &[f32], top_k: usize, min_score: f32) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality every stored vector has.
    fn dimensions(&self) -> usize;
}

/// Shared, swappable reference to the current index.
///
/// Readers take a [`snapshot`](Self::snapshot) and search it without holding
/// any lock. A rebuild prepares a complete new index and publishes it with
/// [`replace`](Self::replace); in-flight searches keep using the snapshot
/// they already hold.
#[derive(Clone)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<dyn VectorIndex>>>,
}

impl IndexHandle {
    pub fn new(index: impl VectorIndex + 'static) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(index))) }
    }

    /// The index as of now.
    pub async fn snapshot(&self) -> Arc<dyn VectorIndex> {
        self.current.read().await.clone()
    }

    /// Publish `index`, returning the one it replaced.
    pub async fn replace(&self, index: Arc<dyn VectorIndex>) -> Arc<dyn VectorIndex> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, index)
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle").finish_non_exhaustive()
    }
}
