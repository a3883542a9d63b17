//! Command-line flags and the validated server configuration built from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use docqa_rag::RagConfig;

use crate::error::ConfigError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Ask questions about your documents in a local web UI.
#[derive(Debug, Parser)]
#[command(name = "docqa", version)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "DOCQA_HOST", default_value = "127.0.0.1")]
    pub host: String,
    /// Port to bind
    #[arg(long, env = "DOCQA_PORT", default_value_t = 8501)]
    pub port: u16,
    /// Directory holding the vector store snapshots
    #[arg(long, env = "DOCQA_PERSIST_DIR", default_value = "./vector_store")]
    pub persist_dir: PathBuf,
    /// Vector store collection for uploaded documents
    #[arg(long, default_value = "docs")]
    pub collection: String,
    /// Maximum chunk length in characters
    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = 150)]
    pub chunk_overlap: usize,
    /// Chunks retrieved per question
    #[arg(long, default_value_t = 4)]
    pub top_k: usize,
    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,
    /// API key; `API_KEY` is used when this is unset
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Chat completion model
    #[arg(long, default_value = docqa_chat::openai::DEFAULT_CHAT_MODEL)]
    pub chat_model: String,
    /// Embedding model
    #[arg(long, default_value = docqa_rag::openai::DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,
    /// Embedding size; required for models docqa does not know
    #[arg(long)]
    pub embedding_dimensions: Option<usize>,
    /// Timeout in seconds for each model call
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Validated settings for one server run.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub persist_dir: PathBuf,
    pub collection: String,
    pub rag: RagConfig,
    pub base_url: Option<String>,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: Option<usize>,
    pub timeout: Duration,
}

impl ServerConfig {
    /// Validate the flags, reading `API_KEY` when no OpenAI key was given.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Self::from_cli_with_fallback(cli, std::env::var("API_KEY").ok())
    }

    fn from_cli_with_fallback(cli: Cli, fallback_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = cli
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or(fallback_key.filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| {
                ConfigError("OPENAI_API_KEY is not set (API_KEY is also accepted)".to_string())
            })?;

        let rag = RagConfig::builder()
            .chunk_size(cli.chunk_size)
            .chunk_overlap(cli.chunk_overlap)
            .top_k(cli.top_k)
            .build()
            .map_err(|e| ConfigError(e.to_string()))?;

        if cli.timeout_secs == 0 {
            return Err(ConfigError("--timeout-secs must be greater than 0".to_string()));
        }
        if cli.collection.trim().is_empty() {
            return Err(ConfigError("--collection must not be empty".to_string()));
        }

        Ok(Self {
            host: cli.host,
            port: cli.port,
            persist_dir: cli.persist_dir,
            collection: cli.collection,
            rag,
            base_url: cli.base_url,
            api_key,
            chat_model: cli.chat_model,
            embedding_model: cli.embedding_model,
            embedding_dimensions: cli.embedding_dimensions,
            timeout: Duration::from_secs(cli.timeout_secs),
        })
    }
}
