//! Verse chunking.
//!
//! This module provides the [`Chunker`] trait and [`ChapterChunker`], which
//! groups consecutive verses of one chapter into fixed-size passages.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::document::Chunk;
use crate::verse::Verse;

/// A strategy for grouping verses into retrievable chunks.
///
/// Implementations must be deterministic: the same verses in the same order
/// always produce the same chunks.
pub trait Chunker: Send + Sync {
    /// Group `verses` (in source order) into chunks.
    ///
    /// Returns an empty `Vec` when `verses` is empty.
    fn chunk(&self, verses: &[Verse]) -> Vec<Chunk>;
}

/// Splits each chapter into runs of `chunk_size` consecutive verses.
///
/// Verses are grouped by `(translation, book, chapter)` in order of first
/// appearance, keeping source order inside each group. A verse whose identity
/// was already seen is dropped (first occurrence wins), so a chapter listed
/// twice never produces overlapping chunks. The last run of a
/// chapter may be shorter, and a chapter shorter than `chunk_size` becomes a
/// single chunk. A chunk never spans a chapter.
///
/// # Example
///
/// ```rust,ignore
/// use scripture_rag::{ChapterChunker, Chunker};
///
/// let chunks = ChapterChunker::new(3).chunk(&verses);
/// ```
#[derive(Debug, Clone)]
pub struct ChapterChunker {
    chunk_size: usize,
}

impl ChapterChunker {
    /// Create a new `ChapterChunker`. A `chunk_size` of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for ChapterChunker {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHUNK_SIZE)
    }
}

impl Chunker for ChapterChunker {
    fn chunk(&self, verses: &[Verse]) -> Vec<Chunk> {
        build_chunks(verses, self.chunk_size)
    }
}

/// Group `verses` into chapter-respecting chunks of at most `chunk_size` verses.
///
/// See [`ChapterChunker`] for the grouping rules.
pub fn build_chunks(verses: &[Verse], chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);

    let mut seen: HashSet<(&str, &str, u32, u32)> = HashSet::new();
    let mut duplicates = 0usize;
    let mut slots: HashMap<(&str, &str, u32), usize> = HashMap::new();
    let mut groups: Vec<Vec<&Verse>> = Vec::new();
    for verse in verses {
        if !seen.insert((verse.translation.as_str(), verse.book.as_str(), verse.chapter, verse.verse)) {
            duplicates += 1;
            continue;
        }
        let key = (verse.translation.as_str(), verse.book.as_str(), verse.chapter);
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(verse);
    }
    if duplicates > 0 {
        warn!(duplicates, "dropped repeated verses while chunking");
    }

    groups
        .iter()
        .flat_map(|group| group.chunks(chunk_size))
        .filter_map(make_chunk)
        .collect()
}

fn make_chunk(run: &[&Verse]) -> Option<Chunk> {
    let first = run.first()?;
    let last = run.last()?;

    let text = run.iter().map(|v| v.text.trim()).collect::<Vec<_>>().join(" ");

    Some(Chunk {
        id: format!(
            "{}:{}:{}:{}-{}",
            first.translation, first.book, first.chapter, first.verse, last.verse
        ),
        translation: first.translation.clone(),
        book: first.book.clone(),
        chapter: first.chapter,
        verse_start: first.verse,
        verse_end: last.verse,
        verses: run.iter().map(|v| v.key()).collect(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis_1(count: u32) -> Vec<Verse> {
        (1..=count).map(|n| Verse::new("Genesis", 1, n, format!("verse {n}"), "WEB")).collect()
    }

    #[test]
    fn splits_chapter_into_fixed_runs() {
        let chunks = build_chunks(&genesis_1(5), 3);

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].verse_start, chunks[0].verse_end), (1, 3));
        assert_eq!((chunks[1].verse_start, chunks[1].verse_end), (4, 5));
        assert_eq!(chunks[0].reference(), "Genesis 1:1-3");
        assert_eq!(chunks[0].text, "verse 1 verse 2 verse 3");
        assert_eq!(chunks[1].verses.len(), 2);
    }

    #[test]
    fn short_chapter_is_single_chunk() {
        let chunks = build_chunks(&genesis_1(2), 3);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].verses.len(), 2);
    }

    #[test]
    fn never_spans_chapters_or_books() {
        let mut verses = genesis_1(2);
        verses.push(Verse::new("Genesis", 2, 1, "next chapter", "WEB"));
        verses.push(Verse::new("Exodus", 1, 1, "next book", "WEB"));

        let chunks = build_chunks(&verses, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].reference(), "Genesis 2:1");
        assert_eq!(chunks[2].book, "Exodus");
    }

    #[test]
    fn groups_interleaved_chapters_in_first_seen_order() {
        let verses = vec![
            Verse::new("John", 3, 16, "a", "WEB"),
            Verse::new("John", 1, 1, "b", "WEB"),
            Verse::new("John", 3, 17, "c", "WEB"),
        ];
        let chunks = build_chunks(&verses, 3);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "WEB:John:3:16-17");
        assert_eq!(chunks[1].id, "WEB:John:1:1-1");
    }

    #[test]
    fn translations_are_chunked_separately() {
        let verses = vec![
            Verse::new("Psalms", 23, 1, "The LORD is my shepherd", "WEB"),
            Verse::new("Psalms", 23, 1, "Jehovah is my shepherd", "Darby"),
        ];
        let chunks = build_chunks(&verses, 3);
        assert_eq!(chunks.len(), 2);
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    #[test]
    fn repeated_chapter_keeps_first_copy() {
        let verses: Vec<Verse> = (1..=4)
            .chain(1..=4)
            .map(|n| Verse::new("John", 3, n, format!("verse {n}"), "WEB"))
            .collect();

        let chunks = build_chunks(&verses, 3);

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["WEB:John:3:1-3", "WEB:John:3:4-4"]);
        let numbers: Vec<u32> = chunks[0].verses.iter().map(|k| k.verse).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn zero_chunk_size_behaves_as_one() {
        let chunks = ChapterChunker::new(0).chunk(&genesis_1(3));
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn empty_input_gives_no_chunks() {
        assert!(build_chunks(&[], 3).is_empty());
    }
}
