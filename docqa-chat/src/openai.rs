//! OpenAI-compatible chat completions client.
//!
//! This module is only available when the `openai` feature is enabled.
//!
//! Failed requests are not retried here. A rate limit or server error
//! surfaces immediately as [`ChatError::GenerationError`] so the caller's
//! deadline and retry flow stay in charge.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{ChatError, Result};
use crate::llm::{ChatMessage, Llm, MessageRole};

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

const PROVIDER: &str = "OpenAI";

/// Settings for [`OpenAIChatModel`].
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API; `None` uses api.openai.com.
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl OpenAIChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chat model backed by the OpenAI chat completions API or a compatible gateway.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] for an empty API key or if the HTTP
    /// client cannot be built.
    pub fn new(config: OpenAIChatConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ChatError::ConfigError("API key must not be empty".to_string()));
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.trim_end_matches('/'));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        let no_retry = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Ok(Self {
            client: Client::with_config(openai_config)
                .with_http_client(http_client)
                .with_backoff(no_retry),
            model: config.model,
            temperature: config.temperature,
        })
    }
}

fn to_request_message(message: &ChatMessage) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.as_str();
    Ok(match message.role {
        MessageRole::System => {
            ChatCompletionRequestSystemMessageArgs::default().content(content).build()?.into()
        }
        MessageRole::User => {
            ChatCompletionRequestUserMessageArgs::default().content(content).build()?.into()
        }
        MessageRole::Assistant => {
            ChatCompletionRequestAssistantMessageArgs::default().content(content).build()?.into()
        }
    })
}

fn generation_error(message: impl Into<String>) -> ChatError {
    ChatError::GenerationError { provider: PROVIDER.to_string(), message: message.into() }
}

#[async_trait]
impl Llm for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, messages = messages.len(), "chat completion");

        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| generation_error(format!("failed to build request: {e}")))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| generation_error(format!("failed to build request: {e}")))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "chat completion failed");
            generation_error(format!("API error: {e}"))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| generation_error("API returned an empty completion"))
    }
}
