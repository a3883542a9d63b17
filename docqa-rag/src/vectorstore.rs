//! Storage for embedded chunks.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// Named collections of embedded [`Chunk`]s searchable by cosine similarity.
///
/// Records keep the order they were first inserted in; that order breaks
/// ties between equal scores.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists with the same
    /// dimensionality; an error if it exists with a different one.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or replace chunks. Every chunk must carry an embedding of the
    /// collection's dimensionality.
    ///
    /// The call is atomic: on error no chunk of `chunks` has been stored.
    /// Re-upserting an existing ID replaces the record in place.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Remove the chunks with the given IDs. Unknown IDs are ignored.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// The `top_k` chunks closest to `embedding`, fewer only when the
    /// collection holds fewer.
    ///
    /// Returns results ordered by descending similarity score; equal scores
    /// keep insertion order.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of records in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}
