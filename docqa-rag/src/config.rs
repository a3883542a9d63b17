//! Configuration for the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Longest chunk, in characters.
    pub chunk_size: usize,
    /// Characters repeated at the start of each chunk from the end of the previous one.
    pub chunk_overlap: usize,
    /// Results returned per query.
    pub top_k: usize,
    /// Minimum similarity score for results. `None` keeps every result.
    pub similarity_threshold: Option<f32>,
    /// Maximum number of texts sent to the embedding provider per request.
    pub embed_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
            top_k: 4,
            similarity_threshold: None,
            embed_batch_size: 64,
        }
    }
}

impl RagConfig {
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters can drive a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] when a size or count is zero, or when
    /// the overlap is not smaller than the chunk size (chunking would never
    /// advance).
    pub fn validate(&self) -> Result<()> {
        require(self.chunk_size > 0, || "chunk_size must be greater than zero".to_string())?;
        require(self.chunk_overlap < self.chunk_size, || {
            format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )
        })?;
        require(self.top_k > 0, || "top_k must be greater than zero".to_string())?;
        require(self.embed_batch_size > 0, || {
            "embed_batch_size must be greater than zero".to_string()
        })
    }
}

fn require(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition { Ok(()) } else { Err(RagError::ConfigError(message())) }
}

/// Starts from [`RagConfig::default`]; [`build`](Self::build) validates.
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop query results scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Chunk texts sent per embedding request.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// See [`RagConfig::validate`] for the checks applied.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
