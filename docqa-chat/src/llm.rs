//! The language model interface used by the orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role of a message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// A hosted or local chat model.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model name, used in logs and errors.
    fn name(&self) -> &str;

    /// Produce the assistant's reply to `messages`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::GenerationError`](crate::ChatError::GenerationError)
    /// on network, authentication, or response errors.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}
