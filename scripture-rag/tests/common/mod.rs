//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use async_trait::async_trait;
use scripture_rag::{CompletionProvider, EmbeddingProvider, RagError, Result, Verse};

/// Vocabulary of [`KeywordEmbedder`]; one dimension per word.
pub const VOCAB: [&str; 8] = ["god", "loved", "world", "shepherd", "light", "sea", "bread", "king"];

const MODE_OK: u8 = 0;
const MODE_FAIL: u8 = 1;
const MODE_HANG: u8 = 2;

/// Bag-of-words embedder over [`VOCAB`] with call counting and switchable
/// failure modes.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    mode: AtomicU8,
    seen: Mutex<Vec<String>>,
    poison: Option<&'static str>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any text containing `word`.
    pub fn poisoned(word: &'static str) -> Self {
        Self { poison: Some(word), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `embed` calls made with exactly `text`.
    pub fn calls_for(&self, text: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|t| t.as_str() == text).count()
    }

    pub fn fail_all(&self) {
        self.mode.store(MODE_FAIL, Ordering::SeqCst);
    }

    pub fn hang_all(&self) {
        self.mode.store(MODE_HANG, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.mode.store(MODE_OK, Ordering::SeqCst);
    }
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; VOCAB.len()];
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if let Some(i) = VOCAB.iter().position(|v| *v == word) {
            vector[i] += 1.0;
        }
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());

        match self.mode.load(Ordering::SeqCst) {
            MODE_FAIL => return Err(RagError::embedding("keyword", "backend offline")),
            MODE_HANG => std::future::pending::<()>().await,
            _ => {}
        }
        if self.poison.is_some_and(|word| text.contains(word)) {
            return Err(RagError::embedding("keyword", "rejected input"));
        }
        Ok(bag_of_words(text))
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Keyword embedder that takes `delay` per call and records how many calls
/// were in flight at once.
pub struct SlowEmbedder {
    delay: std::time::Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowEmbedder {
    pub fn new(delay: std::time::Duration) -> Self {
        Self { delay, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
    }

    /// Highest number of overlapping `embed` calls seen so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(bag_of_words(text))
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Echoes the prompt it was given.
#[derive(Default)]
pub struct EchoCompletion {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CompletionProvider for EchoCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(prompt.to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// A completion backend that is always unreachable.
pub struct OfflineCompletion;

#[async_trait]
impl CompletionProvider for OfflineCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::completion("offline", "connection refused"))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// John 3:16 plus ten unrelated verses, each in its own chapter.
pub fn john_and_unrelated() -> Vec<Verse> {
    let mut verses = vec![Verse::new(
        "John",
        3,
        16,
        "For God so loved the world, that he gave his one and only Son, that whoever believes in him should not perish, but have eternal life.",
        "WEB",
    )];
    let unrelated = [
        ("Psalms", 23, 1, "Yahweh is my shepherd: I shall lack nothing."),
        ("Genesis", 1, 3, "Then there was light."),
        ("Exodus", 14, 21, "Moses stretched out his hand over the sea."),
        ("John", 6, 35, "Jesus said to them, I am the bread of life."),
        ("Judges", 17, 6, "In those days there was no king in Israel."),
        ("Ruth", 1, 16, "Where you go, I will go."),
        ("Proverbs", 6, 6, "Go to the ant, you sluggard."),
        ("Jonah", 1, 17, "Jonah was in the belly of the fish three days and three nights."),
        ("Mark", 4, 39, "Peace! Be still!"),
        ("Acts", 9, 3, "Suddenly a light from the sky shone around him."),
    ];
    verses.extend(
        unrelated
            .into_iter()
            .map(|(book, chapter, verse, text)| Verse::new(book, chapter, verse, text, "WEB")),
    );
    verses
}
