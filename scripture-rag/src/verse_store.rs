//! Verse store: load-once cache over a verse data source.
//!
//! A [`VerseStore`] wraps a [`VerseSource`] and reads it at most once for the
//! lifetime of the store. A missing or malformed source is logged and treated
//! as an empty verse set, so callers never fail because Scripture data is
//! unavailable.
//!
//! # Example
//!
//! ```rust,ignore
//! use scripture_rag::{JsonFileSource, VerseStore};
//!
//! let store = VerseStore::new(JsonFileSource::new("data/bible/web.json"));
//! let verses = store.load_all().await;
//! let psalm = store.get_range("Psalms", 23, 1, None).await;
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{RagError, Result};
use crate::verse::Verse;

/// A source of verse records, read once by a [`VerseStore`].
#[async_trait]
pub trait VerseSource: Send + Sync {
    /// Read every verse from the source, in source order.
    async fn load(&self) -> Result<Vec<Verse>>;

    /// Short description used in logs and errors.
    fn describe(&self) -> String;
}

/// A single JSON file containing an array of verse records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

async fn read_verse_file(path: &Path) -> Result<Vec<Verse>> {
    let source_name = path.display().to_string();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| RagError::DataLoad {
        source_name: source_name.clone(),
        message: format!("failed to read file: {e}"),
    })?;
    serde_json::from_str::<Vec<Verse>>(&raw).map_err(|e| RagError::DataLoad {
        source_name,
        message: format!("malformed verse data: {e}"),
    })
}

#[async_trait]
impl VerseSource for JsonFileSource {
    async fn load(&self) -> Result<Vec<Verse>> {
        read_verse_file(&self.path).await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Every `*.json` verse file in a directory (one file per translation).
///
/// Files are read in file-name order so the combined verse order is stable.
/// A malformed file fails the whole load.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    dir: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl VerseSource for JsonDirectorySource {
    async fn load(&self) -> Result<Vec<Verse>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| RagError::DataLoad {
            source_name: self.describe(),
            message: format!("failed to read directory: {e}"),
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| RagError::DataLoad {
            source_name: self.describe(),
            message: format!("failed to list directory: {e}"),
        })? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut verses = Vec::new();
        for path in files {
            let loaded = read_verse_file(&path).await?;
            debug!(file = %path.display(), verse_count = loaded.len(), "read verse file");
            verses.extend(loaded);
        }
        Ok(verses)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Verses held in memory, for tests and embedded data.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    verses: Vec<Verse>,
}

impl StaticSource {
    pub fn new(verses: Vec<Verse>) -> Self {
        Self { verses }
    }
}

#[async_trait]
impl VerseSource for StaticSource {
    async fn load(&self) -> Result<Vec<Verse>> {
        Ok(self.verses.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Normalized verses in source order, keeping the first verse for each
/// [`VerseKey`](crate::VerseKey).
fn dedup_verses(verses: Vec<Verse>) -> impl Iterator<Item = Verse> {
    let mut seen = HashSet::new();
    verses.into_iter().filter(move |v| seen.insert(v.key())).map(Verse::normalize)
}

/// How the cached verse set was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// The source has not been read yet.
    NotLoaded,
    /// The source was read successfully.
    Loaded,
    /// The source failed; the store holds an empty set.
    Degraded(String),
}

struct LoadedVerses {
    verses: Arc<[Verse]>,
    status: LoadStatus,
}

/// Load-once, read-many cache of verses.
///
/// Concurrent first calls to [`load_all`](Self::load_all) share a single read
/// of the source.
pub struct VerseStore {
    source: Box<dyn VerseSource>,
    loaded: OnceCell<LoadedVerses>,
}

impl VerseStore {
    pub fn new(source: impl VerseSource + 'static) -> Self {
        Self { source: Box::new(source), loaded: OnceCell::new() }
    }

    /// Return every verse, reading the source on first call only.
    ///
    /// Never fails: a source error is logged and yields an empty set.
    pub async fn load_all(&self) -> Arc<[Verse]> {
        self.loaded().await.verses.clone()
    }

    /// Status of the cached set; [`LoadStatus::NotLoaded`] before the first load.
    pub fn load_status(&self) -> LoadStatus {
        self.loaded.get().map_or(LoadStatus::NotLoaded, |l| l.status.clone())
    }

    async fn loaded(&self) -> &LoadedVerses {
        self.loaded
            .get_or_init(|| async {
                let source = self.source.describe();
                match self.source.load().await {
                    Ok(verses) => {
                        let read = verses.len();
                        let verses: Arc<[Verse]> = dedup_verses(verses).collect();
                        if verses.len() < read {
                            warn!(
                                source = %source,
                                duplicates = read - verses.len(),
                                "dropped verses with repeated identity"
                            );
                        }
                        info!(source = %source, verse_count = verses.len(), "loaded verses");
                        LoadedVerses { verses, status: LoadStatus::Loaded }
                    }
                    Err(e) => {
                        warn!(source = %source, error = %e, "verse data unavailable, continuing with empty set");
                        LoadedVerses {
                            verses: Arc::from(Vec::new()),
                            status: LoadStatus::Degraded(e.to_string()),
                        }
                    }
                }
            })
            .await
    }

    /// Verses of `book` `chapter` from `verse_start` through `verse_end`
    /// (inclusive; `None` runs to the end of the chapter), in source order.
    pub async fn get_range(
        &self,
        book: &str,
        chapter: u32,
        verse_start: u32,
        verse_end: Option<u32>,
    ) -> Vec<Verse> {
        self.filter_range(None, book, chapter, verse_start, verse_end).await
    }

    /// Like [`get_range`](Self::get_range), restricted to one translation.
    pub async fn get_range_in(
        &self,
        translation: &str,
        book: &str,
        chapter: u32,
        verse_start: u32,
        verse_end: Option<u32>,
    ) -> Vec<Verse> {
        self.filter_range(Some(translation), book, chapter, verse_start, verse_end).await
    }

    async fn filter_range(
        &self,
        translation: Option<&str>,
        book: &str,
        chapter: u32,
        verse_start: u32,
        verse_end: Option<u32>,
    ) -> Vec<Verse> {
        let end = verse_end.unwrap_or(u32::MAX);
        self.load_all()
            .await
            .iter()
            .filter(|v| translation.is_none_or(|t| v.translation.eq_ignore_ascii_case(t)))
            .filter(|v| v.book.eq_ignore_ascii_case(book) && v.chapter == chapter)
            .filter(|v| v.verse >= verse_start && v.verse <= end)
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over verse text.
    pub async fn search(&self, query: &str) -> Vec<Verse> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.load_all()
            .await
            .iter()
            .filter(|v| v.text.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Distinct translation codes, in first-seen order.
    pub async fn translations(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for verse in self.load_all().await.iter() {
            if !seen.contains(&verse.translation) {
                seen.push(verse.translation.clone());
            }
        }
        seen
    }
}

impl std::fmt::Debug for VerseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerseStore")
            .field("source", &self.source.describe())
            .field("status", &self.load_status())
            .finish()
    }
}
