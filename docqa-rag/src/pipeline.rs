//! Ingest and query over one vector store.
//!
//! [`RagPipeline`] chunks documents, embeds the chunks with an
//! [`EmbeddingProvider`], and keeps them in a [`VectorStore`]. Queries embed
//! the question, take the `top_k` nearest chunks by cosine similarity, and
//! optionally pass them through a [`Reranker`] and a score threshold.
//!
//! ```rust,ignore
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new(key)?))
//!     .vector_store(Arc::new(PersistentVectorStore::open("./vector_store").await?))
//!     .build()?;
//!
//! pipeline.create_collection("docs").await?;
//! pipeline.ingest_batch("docs", &loader::load("notes.txt", &bytes)?).await?;
//! let hits = pipeline.query("docs", "What color is the sky?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::reranker::Reranker;
use crate::vectorstore::VectorStore;

/// Chunk, embed and store on the way in; embed, search, rerank and filter on
/// the way out. Built with [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create a named collection sized for the configured embedding provider.
    ///
    /// # Errors
    ///
    /// Returns the vector store's error if the collection cannot be created,
    /// for example because it already exists with another dimensionality.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.inspect_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
        })
    }

    /// Delete a named collection from the vector store.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.inspect_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
        })
    }

    /// Number of stored chunks in a collection.
    pub async fn count(&self, collection: &str) -> Result<usize> {
        self.vector_store.count(collection).await
    }

    /// Ingest a single document: chunk → embed → store.
    ///
    /// Returns the chunks that were stored (with embeddings attached).
    pub async fn ingest(&self, collection: &str, document: &Document) -> Result<Vec<Chunk>> {
        self.ingest_batch(collection, std::slice::from_ref(document)).await
    }

    /// Ingest several documents as one unit.
    ///
    /// All chunks are embedded before anything is written, then stored with a
    /// single upsert, so either every chunk of the call is stored or none is.
    /// Documents with empty text contribute no chunks; if no document produces
    /// a chunk the store is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails or returns
    /// the wrong number of vectors, or the store's error if the upsert fails.
    pub async fn ingest_batch(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<Vec<Chunk>> {
        // 1. Chunk every document
        let mut chunks: Vec<Chunk> =
            documents.iter().flat_map(|document| self.chunker.chunk(document)).collect();
        if chunks.is_empty() {
            info!(documents = documents.len(), chunk_count = 0, "ingested documents (empty)");
            return Ok(chunks);
        }

        // 2. Generate embeddings batch by batch
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.embed_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
                error!(documents = documents.len(), error = %e, "embedding failed during ingestion");
            })?;
            if vectors.len() != texts.len() {
                return Err(RagError::EmbeddingError {
                    provider: self.embedding_provider.name().to_string(),
                    message: format!(
                        "expected {} embeddings, provider returned {}",
                        texts.len(),
                        vectors.len()
                    ),
                });
            }
            embeddings.extend(vectors);
        }

        // 3. Attach embeddings to chunks
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        // 4. Upsert into vector store in one call
        self.vector_store.upsert(collection, &chunks).await.inspect_err(|e| {
            error!(collection, error = %e, "upsert failed during ingestion");
        })?;

        info!(documents = documents.len(), chunk_count = chunks.len(), "ingested documents");
        Ok(chunks)
    }

    /// Query with the configured `top_k`. See [`query_top_k`](Self::query_top_k).
    pub async fn query(&self, collection: &str, query: &str) -> Result<Vec<SearchResult>> {
        self.query_top_k(collection, query, self.config.top_k).await
    }

    /// Query the pipeline: embed → search → rerank → filter by threshold.
    ///
    /// Returns at most `top_k` results ordered by descending relevance; equal
    /// scores keep insertion order, so repeated queries against an unchanged
    /// store return identical results.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] if the collection is missing or
    /// empty, or if search or reranking fails, and
    /// [`RagError::QueryEmbeddingError`] if the query cannot be embedded.
    pub async fn query_top_k(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        // 1. Refuse to search an empty store
        let count = self.vector_store.count(collection).await.map_err(|e| {
            error!(collection, error = %e, "vector store unavailable");
            RagError::RetrievalError(format!("store unavailable: {e}"))
        })?;
        if count == 0 {
            return Err(RagError::RetrievalError(format!(
                "collection '{collection}' is empty; upload documents first"
            )));
        }

        // 2. Embed the query
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::QueryEmbeddingError(Box::new(e))
        })?;

        // 3. Search the vector store
        let results =
            self.vector_store.search(collection, &query_embedding, top_k).await.map_err(|e| {
                error!(collection, error = %e, "vector store search failed");
                RagError::RetrievalError(format!("search failed in collection '{collection}': {e}"))
            })?;

        // 4. Rerank if a reranker is configured
        let results = match &self.reranker {
            Some(reranker) => reranker.rerank(query, results).await.map_err(|e| {
                error!(error = %e, "reranking failed");
                RagError::RetrievalError(format!("reranking failed: {e}"))
            })?,
            None => results,
        };

        // 5. Filter by similarity threshold
        let filtered: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(collection, top_k, result_count = filtered.len(), "query completed");
        Ok(filtered)
    }
}

/// `embedding_provider` and `vector_store` are required. `config` defaults to
/// [`RagConfig::default()`], `chunker` to a [`RecursiveChunker`] sized from the
/// config, and `reranker` to none.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set an optional reranker for post-search result reordering.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the config fails [`RagConfig::validate`].
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, reranker: self.reranker })
    }
}
