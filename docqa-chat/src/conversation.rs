//! The ordered, append-only conversation log.

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Conversation history. Turns are only ever appended, never reordered or
/// removed; every append consumes the log and returns the extended one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append one turn.
    pub fn push(mut self, role: Role, content: impl Into<String>) -> Self {
        self.turns.push(Turn { role, content: content.into() });
        self
    }

    /// Append a user message and the assistant's answer to it.
    pub fn with_exchange(self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.push(Role::User, question).push(Role::Assistant, answer)
    }
}
