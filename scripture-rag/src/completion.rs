//! Completion provider boundary.
//!
//! The chat model itself lives outside this crate. [`CompletionProvider`] is
//! the seam through which [`ScriptureRag::converse`](crate::ScriptureRag::converse)
//! hands over the assembled prompt.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;

/// A chat/completion model that answers an assembled prompt.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce the full reply for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Produce the reply as incremental text fragments.
    ///
    /// The default implementation yields the whole [`complete`](Self::complete)
    /// reply as one fragment. Streaming backends should override it.
    async fn complete_stream(&self, prompt: &str) -> Result<BoxStream<'static, Result<String>>> {
        let reply = self.complete(prompt).await?;
        Ok(stream::once(async move { Ok(reply) }).boxed())
    }

    /// Provider name used in logs.
    fn name(&self) -> &str {
        "completion"
    }
}
