//! Configuration for Scripture retrieval.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default number of verses per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 3;
/// Default number of passages returned per query.
pub const DEFAULT_TOP_K: usize = 3;
/// Default minimum cosine similarity for a passage to be returned.
pub const DEFAULT_MIN_SCORE: f32 = 0.6;

/// Configuration parameters for chunking, retrieval and caching.
///
/// The defaults (3 verses per chunk, top 3 passages, minimum score 0.6) are
/// starting points, not tuned values. Every field can be set in JSON; missing
/// fields take their default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Number of consecutive verses per chunk.
    pub chunk_size: usize,
    /// Number of passages returned when the caller does not say.
    pub top_k: usize,
    /// Minimum cosine similarity for a passage to be returned.
    pub min_score: f32,
    /// Maximum number of cached query embeddings (0 disables caching).
    pub cache_capacity: usize,
    /// How long a cached query embedding stays valid, in seconds.
    pub cache_ttl_secs: u64,
    /// Number of chunks sent to the embedding provider per batch.
    pub embed_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            cache_capacity: 128,
            cache_ttl_secs: 300,
            embed_batch_size: 16,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RagConfig = serde_json::from_str(json)
            .map_err(|e| RagError::Config(format!("invalid configuration JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Check that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `top_k == 0`
    /// - `embed_batch_size == 0`
    /// - `min_score` is not within `[-1.0, 1.0]`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::Config("embed_batch_size must be greater than zero".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.min_score) {
            return Err(RagError::Config(format!(
                "min_score ({}) must be between -1.0 and 1.0",
                self.min_score
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of verses per chunk.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the default number of passages to return.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity score.
    pub fn min_score(mut self, score: f32) -> Self {
        self.config.min_score = score;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Build the [`RagConfig`], validating it with [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
