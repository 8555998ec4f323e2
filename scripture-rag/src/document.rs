//! Data types for chunks and search results.

use serde::{Deserialize, Serialize};

use crate::verse::VerseKey;

/// A run of consecutive verses from one chapter, retrieved as a unit.
///
/// Chunks are produced by a [`Chunker`](crate::Chunker) and never span a
/// chapter (and therefore never span a book).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `"{translation}:{book}:{chapter}:{start}-{end}"`.
    pub id: String,
    /// Translation code shared by every verse in the chunk.
    pub translation: String,
    /// Book shared by every verse in the chunk.
    pub book: String,
    /// Chapter shared by every verse in the chunk.
    pub chapter: u32,
    /// Number of the first verse.
    pub verse_start: u32,
    /// Number of the last verse.
    pub verse_end: u32,
    /// The verses in source order.
    pub verses: Vec<VerseKey>,
    /// Verse texts joined with a single space.
    pub text: String,
}

impl Chunk {
    /// Display reference, e.g. `"Genesis 1:1-3"` or `"John 3:16"`.
    pub fn reference(&self) -> String {
        if self.verse_start == self.verse_end {
            format!("{} {}:{}", self.book, self.chapter, self.verse_start)
        } else {
            format!("{} {}:{}-{}", self.book, self.chapter, self.verse_start, self.verse_end)
        }
    }
}

/// A [`Chunk`] paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A passage reference and its text, as handed to callers of the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievedPassage {
    /// Display reference, e.g. `"Psalms 23:1-3"`.
    pub reference: String,
    /// Translation code of the passage.
    pub translation: String,
    /// Passage text.
    pub text: String,
}

impl From<&Chunk> for RetrievedPassage {
    fn from(chunk: &Chunk) -> Self {
        Self {
            reference: chunk.reference(),
            translation: chunk.translation.clone(),
            text: chunk.text.clone(),
        }
    }
}
