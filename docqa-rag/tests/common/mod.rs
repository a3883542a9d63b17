//! Deterministic embedding providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, KeywordEmbeddingProvider, RagError};

/// [`KeywordEmbeddingProvider`] that also counts batch requests.
pub struct KeywordEmbedder {
    inner: KeywordEmbeddingProvider,
    pub batch_calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { inner: KeywordEmbeddingProvider::new(dimensions), batch_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> docqa_rag::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Embedder that succeeds for the first `ok_batches` batch calls and fails
/// afterwards; single-text `embed` always fails.
pub struct FailingEmbedder {
    inner: KeywordEmbeddingProvider,
    ok_batches: usize,
    calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn new(dimensions: usize, ok_batches: usize) -> Self {
        Self { inner: KeywordEmbeddingProvider::new(dimensions), ok_batches, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> docqa_rag::Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "Failing".into(), message: "401 Unauthorized".into() })
    }

    async fn embed_batch(&self, texts: &[&str]) -> docqa_rag::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.ok_batches {
            return self.inner.embed_batch(texts).await;
        }
        Err(RagError::EmbeddingError { provider: "Failing".into(), message: "connection reset".into() })
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "Failing"
    }
}
