//! Scripted model for tests and offline demos.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ChatError, Result};
use crate::llm::{ChatMessage, Llm};

/// An [`Llm`] that replays queued replies and records every request.
///
/// When the queue is empty it answers with the fallback reply.
#[derive(Debug, Default)]
pub struct MockLlm {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    /// A model that always answers `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self { fallback: reply.into(), ..Self::default() }
    }

    /// Queue a successful reply, used before the fallback.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()))
    }

    /// Queue a failure, used before the fallback.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    /// Sleep this long before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(self, reply: std::result::Result<String, String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.replies.lock().ok().and_then(|mut replies| replies.pop_front());
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => {
                Err(ChatError::GenerationError { provider: "mock".to_string(), message })
            }
            None => Ok(self.fallback.clone()),
        }
    }
}
