//! Bounded, expiring cache of query embeddings.
//!
//! Repeated questions within a conversation ("what does the Bible say about
//! forgiveness?") are common. Caching the query embedding skips the
//! embedding call on a repeat while still searching the current index, so a
//! rebuilt index never serves stale passages.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cache key for `query`: trimmed, lower-cased, internal whitespace collapsed.
///
/// `"  God so  loved the World "` and `"god so loved the world"` share a key.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

#[derive(Debug)]
struct CacheEntry {
    embedding: Arc<[f32]>,
    inserted_at: Instant,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    tick: u64,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Least-recently-used cache of query embeddings with a fixed time-to-live.
///
/// A capacity of zero disables caching. Time is measured with
/// [`tokio::time::Instant`], so expiry follows a paused test clock.
#[derive(Debug)]
pub struct QueryCache {
    capacity: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached embedding for `query`, if present and not expired.
    pub async fn get(&self, query: &str) -> Option<Arc<[f32]>> {
        if self.capacity == 0 {
            return None;
        }
        let key = normalize_query(query);
        let mut state = self.state.lock().await;
        state.tick += 1;
        let tick = state.tick;

        let ttl = self.ttl;
        if state.entries.get(&key).is_some_and(|entry| entry.inserted_at.elapsed() >= ttl) {
            state.entries.remove(&key);
        }
        let fresh = state.entries.get_mut(&key).map(|entry| {
            entry.last_used = tick;
            entry.embedding.clone()
        });

        match fresh {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        fresh
    }

    /// Store the embedding for `query`, evicting expired entries first and
    /// then the least recently used one if the cache is still full.
    pub async fn insert(&self, query: &str, embedding: Arc<[f32]>) {
        if self.capacity == 0 {
            return;
        }
        let key = normalize_query(query);
        let mut state = self.state.lock().await;
        state.tick += 1;
        let tick = state.tick;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let ttl = self.ttl;
            state.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        }
        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
            }
        }

        state
            .entries
            .insert(key, CacheEntry { embedding, inserted_at: Instant::now(), last_used: tick });
    }

    /// Number of entries currently held, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
