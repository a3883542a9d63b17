//! The chat session state machine.
//!
//! ```text
//! AwaitingInput --UserMessage--> Retrieving --Retrieved--> Generating --Generated--> AwaitingInput
//!                                    |                         |
//!                                    +-------CallFailed--------+--> Failed --Retry--> AwaitingInput
//! ```
//!
//! [`ChatPhase::next`] is pure; the orchestrator drives it and carries the
//! [`Conversation`] alongside in a [`ChatSession`] passed by value.

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::error::{ChatError, Result};

/// Where a chat session is in the retrieve → generate cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    #[default]
    AwaitingInput,
    Retrieving,
    Generating,
    Failed,
}

/// Inputs that move a session between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEvent {
    UserMessage,
    Retrieved,
    Generated,
    CallFailed,
    Retry,
}

impl ChatPhase {
    /// The phase reached by applying `event`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidTransition`] when `event` is not accepted in
    /// this phase.
    pub fn next(self, event: ChatEvent) -> Result<ChatPhase> {
        use ChatEvent::*;
        use ChatPhase::*;

        match (self, event) {
            (AwaitingInput, UserMessage) => Ok(Retrieving),
            (Retrieving, Retrieved) => Ok(Generating),
            (Generating, Generated) => Ok(AwaitingInput),
            (Retrieving | Generating, CallFailed) => Ok(Failed),
            (Failed, Retry) => Ok(AwaitingInput),
            (from, event) => Err(ChatError::InvalidTransition { from, event }),
        }
    }
}

/// A conversation together with its current phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub phase: ChatPhase,
    pub conversation: Conversation,
}
