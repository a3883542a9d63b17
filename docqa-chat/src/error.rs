//! Error types for the `docqa-chat` crate.

use std::time::Duration;

use docqa_rag::RagError;
use thiserror::Error;

use crate::state::{ChatEvent, ChatPhase};

/// Errors surfaced to the user while answering a chat message.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Retrieval failed: empty or unavailable store, or the query could not be embedded.
    #[error(transparent)]
    Retrieval(#[from] RagError),

    /// The LLM call failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An external call did not finish within the configured timeout.
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        /// `"retrieval"` or `"generation"`.
        stage: &'static str,
        /// The timeout that expired.
        after: Duration,
    },

    /// The session was asked to do something its current phase does not allow.
    #[error("cannot handle {event:?} while {from:?}")]
    InvalidTransition { from: ChatPhase, event: ChatEvent },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ChatError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retrieval(e) => e.kind(),
            Self::GenerationError { .. } => "generation",
            Self::Timeout { .. } => "timeout",
            Self::InvalidTransition { .. } => "invalid_state",
            Self::ConfigError(_) => "config",
        }
    }
}

/// A convenience result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
