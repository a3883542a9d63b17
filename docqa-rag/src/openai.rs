//! OpenAI-compatible embedding provider.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Embedding model used unless another is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const PROVIDER: &str = "OpenAI";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Native output dimension of the well-known OpenAI embedding models.
///
/// Gateway-prefixed names such as `openai.text-embedding-3-large` resolve to
/// their base model.
pub fn known_dimensions(model: &str) -> Option<usize> {
    let base = model.rsplit(['/', '.']).find(|part| part.starts_with("text-embedding"))?;
    match base {
        "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// # Configuration
///
/// - `model` – `text-embedding-3-small` unless changed.
/// - `base_url` – defaults to `https://api.openai.com/v1`; any compatible gateway works.
/// - `dimensions` – required for models not covered by [`known_dimensions`].
/// - `timeout` – per-request timeout, 60 seconds by default.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?
///     .with_model("text-embedding-3-large")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// Sent as the `dimensions` request field when set.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("API key must not be empty".into()));
        }

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: 1536,
            request_dimensions: None,
        })
    }

    /// Use one of the models listed in [`known_dimensions`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the model's dimensionality is not
    /// known. Use [`with_model_and_dimensions`](Self::with_model_and_dimensions)
    /// for custom models.
    pub fn with_model(mut self, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        self.dimensions = known_dimensions(&model).ok_or_else(|| {
            RagError::ConfigError(format!(
                "unknown embedding dimensions for model '{model}'; set them explicitly"
            ))
        })?;
        self.model = model;
        Ok(self)
    }

    /// Set a model whose output dimensionality is supplied by the caller.
    pub fn with_model_and_dimensions(mut self, model: impl Into<String>, dims: usize) -> Self {
        self.model = model.into();
        self.dimensions = dims;
        self
    }

    /// Ask the API to shorten vectors to `dims` (supported by the
    /// `text-embedding-3` family).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Point the provider at an OpenAI-compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| embedding_error(format!("failed to build HTTP client: {e}")))
}

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.to_string(), message: message.into() }
}

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorReply {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAIEmbeddingProvider {
    /// One `/embeddings` round trip. Vectors come back in input order.
    async fn post_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body =
            EmbeddingsBody { model: &self.model, input: texts, dimensions: self.request_dimensions };
        let url = format!("{}/embeddings", self.base_url);

        let response =
            self.client.post(&url).bearer_auth(&self.api_key).json(&body).send().await.map_err(
                |e| {
                    error!(provider = PROVIDER, %url, error = %e, "embedding request failed");
                    embedding_error(format!("request failed: {e}"))
                },
            )?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ApiErrorReply>(&raw) {
                Ok(reply) => reply.error.message,
                Err(_) => raw,
            };
            error!(provider = PROVIDER, %status, "embedding API rejected request");
            return Err(embedding_error(format!("API returned {status}: {detail}")));
        }

        let mut reply: EmbeddingsReply = response
            .json()
            .await
            .map_err(|e| embedding_error(format!("unreadable response: {e}")))?;
        if reply.data.len() != texts.len() {
            return Err(embedding_error(format!(
                "sent {} texts, received {} embeddings",
                texts.len(),
                reply.data.len()
            )));
        }
        reply.data.sort_by_key(|item| item.index);
        Ok(reply.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.post_embeddings(&[text])
            .await?
            .pop()
            .ok_or_else(|| embedding_error("API returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, model = %self.model, batch_size = texts.len(), "embedding batch");
        self.post_embeddings(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_dimensions_handles_gateway_prefixes() {
        assert_eq!(known_dimensions("text-embedding-3-small"), Some(1536));
        assert_eq!(known_dimensions("openai.text-embedding-3-large"), Some(3072));
        assert_eq!(known_dimensions("openai/text-embedding-ada-002"), Some(1536));
        assert_eq!(known_dimensions("nomic-embed-text"), None);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(OpenAIEmbeddingProvider::new(""), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn unknown_model_requires_explicit_dimensions() {
        let provider = OpenAIEmbeddingProvider::new("sk-test").unwrap();
        assert!(provider.with_model("custom-embedder").is_err());

        let provider = OpenAIEmbeddingProvider::new("sk-test")
            .unwrap()
            .with_model_and_dimensions("custom-embedder", 768);
        assert_eq!(provider.dimensions(), 768);
        assert_eq!(provider.model(), "custom-embedder");
    }
}
