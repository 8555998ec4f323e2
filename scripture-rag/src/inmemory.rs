//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryVectorIndex`] keeps entries in insertion order and answers
//! queries with a linear scan. It has no dependencies beyond the standard
//! library and is intended for the few thousand chunks of a Bible
//! translation.

use std::collections::HashMap;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// An in-memory vector index using cosine similarity for search.
///
/// Entries live in a `Vec` in insertion order, with a chunk-id → slot map for
/// replacement. Replacing an entry keeps its original slot, so tie-breaking
/// does not change when a chunk is re-embedded.
///
/// # Example
///
/// ```rust,ignore
/// use scripture_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let mut index = InMemoryVectorIndex::new(384);
/// index.add(chunk, embedding)?;
/// ```
pub struct InMemoryVectorIndex {
    dimensions: usize,
    entries: Vec<Entry>,
    slots: HashMap<String, usize>,
}

impl InMemoryVectorIndex {
    /// Create an empty index for vectors of length `dimensions`.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, entries: Vec::new(), slots: HashMap::new() }
    }

    /// Look up a stored chunk by id.
    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.slots.get(id).map(|&slot| &self.entries[slot].chunk)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorIndex")
            .field("dimensions", &self.dimensions)
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex for InMemoryVectorIndex {
    fn add(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        self.check_dimensions(&embedding)?;
        match self.slots.get(&chunk.id) {
            Some(&slot) => self.entries[slot] = Entry { chunk, embedding },
            None => {
                self.slots.insert(chunk.id.clone(), self.entries.len());
                self.entries.push(Entry { chunk, embedding });
            }
        }
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        self.check_dimensions(query)?;
        if top_k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        // NaN scores fail the comparison and are dropped here.
        let mut scored: Vec<(f32, &Entry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&entry.embedding, query), entry))
            .filter(|(score, _)| *score >= min_score)
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchResult { chunk: entry.chunk.clone(), score })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
