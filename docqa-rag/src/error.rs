//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, storing, or retrieving documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// An uploaded file could not be read or decoded.
    #[error("Ingestion error ({source_name}): {message}")]
    IngestionError {
        /// The file name of the failing upload.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The store is empty or unavailable, or search failed.
    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    /// The provider could not embed the question.
    #[error("Retrieval error: query embedding failed: {0}")]
    QueryEmbeddingError(#[source] Box<RagError>),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IngestionError { .. } => "ingestion",
            Self::EmbeddingError { .. } => "embedding",
            Self::VectorStoreError { .. } | Self::Io(_) | Self::Serialization(_) => "vector_store",
            Self::RetrievalError(_) | Self::QueryEmbeddingError(_) => "retrieval",
            Self::ConfigError(_) => "config",
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
