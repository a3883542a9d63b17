//! # docqa-chat
//!
//! Retrieval-grounded chat for docqa.
//!
//! A [`ChatOrchestrator`] answers each message by querying a
//! [`docqa_rag::RagPipeline`] for context, prompting an [`Llm`] with the
//! instruction, the prior turns and the numbered context, and appending a
//! `Sources:` citation to the reply.
//!
//! ## Example
//!
//! ```rust,ignore
//! use docqa_chat::{ChatConfig, ChatOrchestrator, ChatSession, MockLlm};
//!
//! let orchestrator = ChatOrchestrator::new(pipeline, Arc::new(MockLlm::new("Blue [1].")), ChatConfig::default());
//! let (session, answer) = orchestrator.respond(ChatSession::default(), "What color is the sky?").await;
//! ```

pub mod conversation;
pub mod error;
pub mod llm;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod state;

pub use conversation::{Conversation, Role, Turn};
pub use error::{ChatError, Result};
pub use llm::{ChatMessage, Llm, MessageRole};
pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatConfig, OpenAIChatModel};
pub use orchestrator::{Answer, ChatConfig, ChatOrchestrator};
pub use state::{ChatEvent, ChatPhase, ChatSession};
