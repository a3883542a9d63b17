//! Vector store that lives only as long as the process.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by
//! insertion-ordered collections protected by a `tokio::sync::RwLock`. The
//! [`Collection`] type is shared with the on-disk
//! [`PersistentVectorStore`](crate::persistent::PersistentVectorStore).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An insertion-ordered set of embedded chunks with a fixed dimensionality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) dimensions: usize,
    records: Vec<Chunk>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl Collection {
    pub(crate) fn new(dimensions: usize) -> Self {
        Self { dimensions, records: Vec::new(), positions: HashMap::new() }
    }

    /// Rebuild the ID index after deserialization.
    pub(crate) fn reindex(&mut self) {
        self.positions =
            self.records.iter().enumerate().map(|(i, chunk)| (chunk.id.clone(), i)).collect();
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Validate every chunk before touching any record, so a rejected batch
    /// leaves the collection as it was.
    pub(crate) fn upsert(&mut self, backend: &str, chunks: &[Chunk]) -> Result<()> {
        for chunk in chunks {
            if chunk.embedding.len() != self.dimensions {
                return Err(RagError::VectorStoreError {
                    backend: backend.to_string(),
                    message: format!(
                        "chunk '{}' has embedding of dimension {}, collection expects {}",
                        chunk.id,
                        chunk.embedding.len(),
                        self.dimensions
                    ),
                });
            }
        }

        for chunk in chunks {
            match self.positions.get(&chunk.id) {
                Some(&pos) => self.records[pos] = chunk.clone(),
                None => {
                    self.positions.insert(chunk.id.clone(), self.records.len());
                    self.records.push(chunk.clone());
                }
            }
        }
        Ok(())
    }

    pub(crate) fn delete(&mut self, ids: &[&str]) {
        self.records.retain(|chunk| !ids.contains(&chunk.id.as_str()));
        self.reindex();
    }

    pub(crate) fn search(
        &self,
        backend: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::VectorStoreError {
                backend: backend.to_string(),
                message: format!(
                    "query embedding has dimension {}, collection expects {}",
                    embedding.len(),
                    self.dimensions
                ),
            });
        }

        let mut scored: Vec<SearchResult> = self
            .records
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(&chunk.embedding, embedding),
            })
            .collect();

        // `sort_by` is stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

pub(crate) fn missing_collection(backend: &str, name: &str) -> RagError {
    RagError::VectorStoreError {
        backend: backend.to_string(),
        message: format!("collection '{name}' does not exist"),
    }
}

pub(crate) fn dimension_conflict(backend: &str, name: &str, existing: usize, requested: usize) -> RagError {
    RagError::VectorStoreError {
        backend: backend.to_string(),
        message: format!(
            "collection '{name}' already exists with dimension {existing}, requested {requested}"
        ),
    }
}

/// A [`VectorStore`] that forgets everything on restart.
///
/// Collections map a name to an insertion-ordered list of chunks. All
/// operations are async-safe via `tokio::sync::RwLock`; writers are serialized.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 1536).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.get(name) {
            Some(existing) if existing.dimensions != dimensions => {
                Err(dimension_conflict(BACKEND, name, existing.dimensions, dimensions))
            }
            Some(_) => Ok(()),
            None => {
                collections.insert(name.to_string(), Collection::new(dimensions));
                Ok(())
            }
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store =
            collections.get_mut(collection).ok_or_else(|| missing_collection(BACKEND, collection))?;
        store.upsert(BACKEND, chunks)
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store =
            collections.get_mut(collection).ok_or_else(|| missing_collection(BACKEND, collection))?;
        store.delete(ids);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store =
            collections.get(collection).ok_or_else(|| missing_collection(BACKEND, collection))?;
        store.search(BACKEND, embedding, top_k)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let store =
            collections.get(collection).ok_or_else(|| missing_collection(BACKEND, collection))?;
        Ok(store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: id.to_string(),
            start: 0,
            embedding,
            metadata: HashMap::new(),
            document_id: "doc".to_string(),
        }
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn upsert_rejects_whole_batch_on_dimension_mismatch() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs", 2).await.unwrap();
        let err = store
            .upsert("docs", &[chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reupsert_keeps_single_record_and_position() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs", 2).await.unwrap();
        store.upsert("docs", &[chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0, 0.0])]).await.unwrap();
        store.upsert("docs", &[chunk("a", vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(store.count("docs").await.unwrap(), 2);

        let results = store.search("docs", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].chunk.id, "a");
        assert_eq!(results[1].chunk.id, "b");
    }

    #[tokio::test]
    async fn delete_removes_records() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs", 2).await.unwrap();
        store.upsert("docs", &[chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])]).await.unwrap();
        store.delete("docs", &["a"]).await.unwrap();
        let results = store.search("docs", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "b");
    }

    #[tokio::test]
    async fn create_collection_rejects_different_dimensions() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs", 2).await.unwrap();
        store.create_collection("docs", 2).await.unwrap();
        assert!(store.create_collection("docs", 3).await.is_err());
    }

    #[tokio::test]
    async fn missing_collection_is_an_error() {
        let store = InMemoryVectorStore::new();
        assert!(store.search("nope", &[1.0], 1).await.is_err());
        assert!(store.count("nope").await.is_err());
    }
}
