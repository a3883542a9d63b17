//! Turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// Maps text to fixed-length vectors whose cosine similarity reflects how
/// related two texts are.
///
/// Every vector a provider returns has [`dimensions`](Self::dimensions)
/// entries. [`embed_batch`](Self::embed_batch) falls back to one
/// [`embed`](Self::embed) call per text; providers with a batch endpoint
/// override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text, e.g. a user question.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts. Returns exactly one vector per input, in input
    /// order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Length of every returned vector.
    fn dimensions(&self) -> usize;

    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        "embedding"
    }
}
