//! Answering chat messages over retrieved context.
//!
//! [`ChatOrchestrator::respond`] takes a [`ChatSession`] by value, walks it
//! through the retrieve and generate phases, and hands back the next session
//! together with the outcome. A failed call leaves the conversation exactly as
//! it was; the session is parked in [`ChatPhase::Failed`] and the next message
//! retries from there.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use docqa_rag::RagPipeline;
use serde::Serialize;
use tracing::{info, warn};

use crate::conversation::Conversation;
use crate::error::{ChatError, Result};
use crate::llm::Llm;
use crate::prompt::{
    NO_CONTEXT_ANSWER, SYSTEM_INSTRUCTION, append_citation, build_messages, cited_sources,
};
use crate::state::{ChatEvent, ChatPhase, ChatSession};

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Collection queried for context.
    pub collection: String,
    /// Number of chunks retrieved per message.
    pub top_k: usize,
    /// Bound on each retrieval and generation call.
    pub timeout: Duration,
    /// System instruction sent first in every prompt.
    pub instruction: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            collection: "docs".to_string(),
            top_k: 4,
            timeout: Duration::from_secs(60),
            instruction: SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

/// A cited answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// The reply including its `Sources:` footer.
    pub text: String,
    /// Source identifiers listed in the footer.
    pub sources: Vec<String>,
}

/// Drives chat sessions through retrieval and generation.
pub struct ChatOrchestrator {
    pipeline: Arc<RagPipeline>,
    llm: Arc<dyn Llm>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(pipeline: Arc<RagPipeline>, llm: Arc<dyn Llm>, config: ChatConfig) -> Self {
        Self { pipeline, llm, config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Answer `message` within `session`.
    ///
    /// Always returns the session to keep: on success it holds the new
    /// exchange and is back in [`ChatPhase::AwaitingInput`]; on failure it is
    /// in [`ChatPhase::Failed`] with the previous conversation untouched.
    pub async fn respond(&self, session: ChatSession, message: &str) -> (ChatSession, Result<Answer>) {
        let ChatSession { phase, conversation } = session;

        let phase = match phase {
            ChatPhase::Failed => match phase.next(ChatEvent::Retry) {
                Ok(phase) => {
                    info!("retrying after failed message");
                    phase
                }
                Err(e) => return (ChatSession { phase, conversation }, Err(e)),
            },
            other => other,
        };

        let retrieving = match phase.next(ChatEvent::UserMessage) {
            Ok(next) => next,
            Err(e) => return (ChatSession { phase, conversation }, Err(e)),
        };

        let outcome = self.answer(retrieving, &conversation, message).await;
        match outcome {
            Ok((phase, answer)) => {
                info!(
                    sources = answer.sources.len(),
                    turns = conversation.len() + 2,
                    "answered message"
                );
                let conversation = conversation.with_exchange(message, &answer.text);
                (ChatSession { phase, conversation }, Ok(answer))
            }
            Err((failed_in, e)) => {
                warn!(phase = ?failed_in, kind = e.kind(), error = %e, "message failed");
                let phase = failed_in.next(ChatEvent::CallFailed).unwrap_or(ChatPhase::Failed);
                (ChatSession { phase, conversation }, Err(e))
            }
        }
    }

    /// Runs the retrieve and generate phases. Errors carry the phase they
    /// happened in.
    async fn answer(
        &self,
        phase: ChatPhase,
        conversation: &Conversation,
        message: &str,
    ) -> std::result::Result<(ChatPhase, Answer), (ChatPhase, ChatError)> {
        let results = self
            .bounded(
                "retrieval",
                self.pipeline.query_top_k(&self.config.collection, message, self.config.top_k),
            )
            .await
            .map_err(|e| (phase, e))?;

        let phase = phase.next(ChatEvent::Retrieved).map_err(|e| (phase, e))?;

        let answer = if results.is_empty() {
            Answer { text: NO_CONTEXT_ANSWER.to_string(), sources: Vec::new() }
        } else {
            let messages = build_messages(&self.config.instruction, conversation, message, &results);
            let reply = self
                .bounded("generation", self.llm.generate(&messages))
                .await
                .map_err(|e| (phase, e))?;
            let sources = cited_sources(&reply, &results);
            Answer { text: append_citation(&reply, &sources), sources }
        };

        let phase = phase.next(ChatEvent::Generated).map_err(|e| (phase, e))?;
        Ok((phase, answer))
    }

    async fn bounded<T, E, F>(&self, stage: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<ChatError>,
    {
        let after = self.config.timeout;
        match tokio::time::timeout(after, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ChatError::Timeout { stage, after }),
        }
    }
}
