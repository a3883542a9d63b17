use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use docqa_chat::{
    ChatConfig, ChatOrchestrator, ChatPhase, Conversation, OpenAIChatConfig, OpenAIChatModel,
};
use docqa_rag::{
    OpenAIEmbeddingProvider, PersistentVectorStore, RagPipeline, loader, openai::known_dimensions,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::ServerConfig,
    error::ApiError,
    session::{SessionId, SessionManager},
};

/// Uploads are sent base64-encoded inside JSON, so allow well past axum's 2 MB default.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>, orchestrator: Arc<ChatOrchestrator>) -> Self {
        Self { pipeline, orchestrator, sessions: SessionManager::default() }
    }

    /// Wire the OpenAI providers and the on-disk store described by `config`,
    /// creating the collection if it does not exist yet.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let mut embedder =
            OpenAIEmbeddingProvider::new(&config.api_key)?.with_timeout(config.timeout)?;
        if let Some(base_url) = &config.base_url {
            embedder = embedder.with_base_url(base_url);
        }
        let model = config.embedding_model.as_str();
        let embedder = match config.embedding_dimensions {
            Some(dims) if known_dimensions(model).is_some() => {
                embedder.with_model(model)?.with_dimensions(dims)
            }
            Some(dims) => embedder.with_model_and_dimensions(model, dims),
            None => embedder.with_model(model)?,
        };

        let store = PersistentVectorStore::open(&config.persist_dir)
            .await
            .with_context(|| format!("failed to open {}", config.persist_dir.display()))?;

        let pipeline = RagPipeline::builder()
            .config(config.rag.clone())
            .embedding_provider(Arc::new(embedder))
            .vector_store(Arc::new(store))
            .build()?;
        pipeline.create_collection(&config.collection).await?;

        let mut chat = OpenAIChatConfig::new(&config.api_key)
            .with_model(&config.chat_model)
            .with_timeout(config.timeout);
        if let Some(base_url) = &config.base_url {
            chat = chat.with_base_url(base_url);
        }
        let llm = OpenAIChatModel::new(chat)?;

        let pipeline = Arc::new(pipeline);
        let orchestrator = ChatOrchestrator::new(
            pipeline.clone(),
            Arc::new(llm),
            ChatConfig {
                collection: config.collection.clone(),
                top_k: config.rag.top_k,
                timeout: config.timeout,
                ..ChatConfig::default()
            },
        );
        Ok(Self::new(pipeline, Arc::new(orchestrator)))
    }

    fn collection(&self) -> &str {
        &self.orchestrator.config().collection
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadFile {
    pub filename: String,
    pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: usize,
    pub chunks: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub phase: ChatPhase,
    pub history: Conversation,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub phase: ChatPhase,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/documents", post(upload_documents))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{session_id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{session_id}/messages", post(post_message))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for docqa server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("docqa listening on http://{}", addr);
    axum::serve(listener, app_router(state)).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn upload_documents(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    if request.files.is_empty() {
        return Err(ApiError::BadRequest("no files uploaded".to_string()));
    }

    let mut documents = Vec::new();
    for file in &request.files {
        let bytes = STANDARD.decode(file.content_base64.trim()).map_err(|e| {
            ApiError::BadRequest(format!("'{}' is not valid base64: {e}", file.filename))
        })?;
        documents.extend(loader::load(&file.filename, &bytes)?);
    }

    let chunks = state.pipeline.ingest_batch(state.collection(), &documents).await?;
    info!(files = request.files.len(), documents = documents.len(), chunks = chunks.len(), "upload stored");
    Ok(Json(UploadResponse { files: request.files.len(), chunks: chunks.len() }))
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create_session().await;
    Json(SessionCreateResponse { session_id })
}

async fn get_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session =
        state.sessions.get(&session_id).await.ok_or(ApiError::SessionNotFound(session_id))?;
    let session = session.lock().await;
    Ok(Json(SessionResponse { phase: session.phase, history: session.conversation.clone() }))
}

async fn delete_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&session_id).await {
        info!(%session_id, "session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(session_id))
    }
}

async fn post_message(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let session =
        state.sessions.get(&session_id).await.ok_or(ApiError::SessionNotFound(session_id))?;
    let mut session = session.lock().await;

    let (next, result) = state.orchestrator.respond(session.clone(), message).await;
    let phase = next.phase;
    *session = next;

    let answer = result?;
    Ok(Json(MessageResponse { answer: answer.text, sources: answer.sources, phase }))
}
