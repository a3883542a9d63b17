//! Optional second pass over search results.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// Re-scores and reorders search results for a query.
///
/// Runs after the vector search and before threshold filtering in
/// [`RagPipeline::query_top_k`](crate::RagPipeline::query_top_k).
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Reorder (and possibly re-score) `results` for `query`.
    async fn rerank(&self, query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>>;
}

/// A reranker that returns results unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(&self, _query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>> {
        Ok(results)
    }
}
