//! Error types for the `scripture-rag` crate.

use thiserror::Error;

/// Errors that can occur in Scripture-grounding operations.
///
/// Most of these never reach the caller of [`ScriptureRag`](crate::ScriptureRag):
/// they are logged and turned into a degraded [`Outcome`](crate::Outcome).
/// [`RagError::Cancelled`] is the exception and is always propagated.
#[derive(Debug, Error)]
pub enum RagError {
    /// The verse data source is missing or malformed.
    #[error("Data load error ({source_name}): {message}")]
    DataLoad {
        /// Description of the source that failed (file path, "static", ...).
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding backend could not be reached or returned an error.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector does not match the index dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the index was created with.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to import verses from chapter HTML files.
    #[error("Import error: {0}")]
    Import(String),

    /// The completion backend failed.
    #[error("Completion error ({provider}): {message}")]
    Completion {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
}

impl RagError {
    /// Shorthand for an [`RagError::EmbeddingUnavailable`] error.
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable { provider: provider.into(), message: message.into() }
    }

    /// Shorthand for a [`RagError::Completion`] error, for completion backends.
    pub fn completion(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Completion { provider: provider.into(), message: message.into() }
    }

    /// Returns `true` if this error represents caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A convenience result type for Scripture-grounding operations.
pub type Result<T> = std::result::Result<T, RagError>;
