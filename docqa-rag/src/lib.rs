//! # docqa-rag
//!
//! Ingestion and retrieval for docqa: load uploaded text and PDF files, split
//! them into overlapping chunks, embed the chunks, store them in a vector
//! store, and retrieve the top-k chunks most similar to a query by cosine
//! similarity.
//!
//! ## Overview
//!
//! - [`loader::load`] turns an upload into [`Document`]s (one per PDF page)
//! - [`RecursiveChunker`] / [`FixedSizeChunker`] split documents into [`Chunk`]s
//! - [`EmbeddingProvider`] embeds text; [`OpenAIEmbeddingProvider`] talks to
//!   any OpenAI-compatible `/embeddings` endpoint
//! - [`VectorStore`] stores embedded chunks; [`InMemoryVectorStore`] and
//!   [`PersistentVectorStore`] are the backends
//! - [`RagPipeline`] ties them together behind `ingest` / `query`

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod keyword;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod persistent;
pub mod pipeline;
pub mod reranker;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, DocumentFormat, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use keyword::KeywordEmbeddingProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use persistent::PersistentVectorStore;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use reranker::{NoOpReranker, Reranker};
pub use vectorstore::VectorStore;
