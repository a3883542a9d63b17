//! On-disk vector store.
//!
//! [`PersistentVectorStore`] keeps every collection in memory and mirrors it
//! to `<dir>/<collection>.json`. Each mutation writes a complete snapshot to a
//! temporary file and renames it into place; the in-memory collection is only
//! replaced once that write has succeeded. Removing the directory while the
//! service is stopped resets the corpus.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::inmemory::{Collection, dimension_conflict, missing_collection};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "Persistent";
const SNAPSHOT_EXTENSION: &str = "json";

/// A vector store persisted as one JSON snapshot per collection.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{PersistentVectorStore, VectorStore};
///
/// let store = PersistentVectorStore::open("./vector_store").await?;
/// store.create_collection("docs", 1536).await?;
/// ```
#[derive(Debug)]
pub struct PersistentVectorStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

impl PersistentVectorStore {
    /// Open (creating if needed) a store directory and load every snapshot in it.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error if the directory cannot be
    /// created or a snapshot cannot be parsed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let mut collections = HashMap::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = tokio::fs::read(&path).await?;
            let mut collection: Collection = serde_json::from_slice(&bytes)?;
            collection.reindex();
            debug!(collection = name, records = collection.len(), "loaded snapshot");
            collections.insert(name.to_string(), collection);
        }

        info!(dir = %dir.display(), collections = collections.len(), "opened vector store");
        Ok(Self { dir, collections: RwLock::new(collections) })
    }

    /// The directory holding the snapshots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
    }

    async fn write_snapshot(&self, name: &str, collection: &Collection) -> Result<()> {
        let path = self.snapshot_path(name);
        let tmp = self.dir.join(format!(".{name}.{SNAPSHOT_EXTENSION}.tmp"));
        let bytes = serde_json::to_vec(collection)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(collection = name, records = collection.len(), bytes = bytes.len(), "wrote snapshot");
        Ok(())
    }

    /// Apply `mutate` to a copy of the collection, persist it, then swap it in.
    async fn commit<F>(&self, name: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Collection) -> Result<()>,
    {
        let mut collections = self.collections.write().await;
        let current = collections.get(name).ok_or_else(|| missing_collection(BACKEND, name))?;
        let mut next = current.clone();
        mutate(&mut next)?;
        self.write_snapshot(name, &next).await?;
        collections.insert(name.to_string(), next);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RagError::ConfigError(format!(
            "collection name '{name}' may only contain ASCII letters, digits, '_' and '-'"
        )))
    }
}

#[async_trait]
impl VectorStore for PersistentVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        validate_name(name)?;
        let mut collections = self.collections.write().await;
        match collections.get(name) {
            Some(existing) if existing.dimensions != dimensions => {
                Err(dimension_conflict(BACKEND, name, existing.dimensions, dimensions))
            }
            Some(_) => Ok(()),
            None => {
                let collection = Collection::new(dimensions);
                self.write_snapshot(name, &collection).await?;
                collections.insert(name.to_string(), collection);
                Ok(())
            }
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let mut collections = self.collections.write().await;
        match tokio::fs::remove_file(self.snapshot_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        self.commit(collection, |c| c.upsert(BACKEND, chunks)).await
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        self.commit(collection, |c| {
            c.delete(ids);
            Ok(())
        })
        .await
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

    #[test]
    fn collection_names_must_be_path_safe() {
        assert!(validate_name("docs").is_ok());
        assert!(validate_name("my-docs_2").is_ok());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("").is_err());
    }
}
