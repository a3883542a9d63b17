use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docqa_chat::ChatError;
use docqa_rag::RagError;
use serde_json::json;
use thiserror::Error;

/// Invalid startup configuration.
#[derive(Debug, Error)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

/// Errors returned by the HTTP handlers as `{"error", "kind"}` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::SessionNotFound(_) => "not_found",
            Self::Rag(e) => e.kind(),
            Self::Chat(e) => e.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Rag(e) | Self::Chat(ChatError::Retrieval(e)) => rag_status(e),
            Self::Chat(ChatError::GenerationError { .. }) => StatusCode::BAD_GATEWAY,
            Self::Chat(ChatError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Chat(ChatError::InvalidTransition { .. } | ChatError::ConfigError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn rag_status(error: &RagError) -> StatusCode {
    match error {
        RagError::IngestionError { .. } => StatusCode::BAD_REQUEST,
        RagError::EmbeddingError { .. } | RagError::QueryEmbeddingError(_) => {
            StatusCode::BAD_GATEWAY
        }
        RagError::RetrievalError(_) => StatusCode::CONFLICT,
        RagError::VectorStoreError { .. }
        | RagError::ConfigError(_)
        | RagError::Io(_)
        | RagError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string(), "kind": self.kind() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::SessionNotFound("s".into()), StatusCode::NOT_FOUND),
            (
                RagError::IngestionError { source_name: "a.pdf".into(), message: "bad".into() }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ChatError::from(RagError::RetrievalError("empty".into())).into(),
                StatusCode::CONFLICT,
            ),
            (
                ChatError::GenerationError { provider: "p".into(), message: "m".into() }.into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ChatError::Timeout { stage: "generation", after: Duration::from_secs(1) }.into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn provider_failure_during_retrieval_is_a_bad_gateway() {
        let provider = RagError::EmbeddingError { provider: "OpenAI".into(), message: "401".into() };
        let error: ApiError =
            ChatError::from(RagError::QueryEmbeddingError(Box::new(provider))).into();
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.kind(), "retrieval");
    }

    #[test]
    fn retrieval_kind_passes_through_chat_errors() {
        let error: ApiError = ChatError::from(RagError::RetrievalError("empty".into())).into();
        assert_eq!(error.kind(), "retrieval");
    }
}
