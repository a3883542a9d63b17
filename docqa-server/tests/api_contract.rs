use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use docqa_chat::{ChatConfig, ChatOrchestrator, MockLlm};
use docqa_rag::{InMemoryVectorStore, KeywordEmbeddingProvider, RagPipeline};
use docqa_server::{AppState, app_router};
use serde_json::{Value, json};

async fn spawn_server(llm: MockLlm) -> (String, tokio::task::JoinHandle<()>) {
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(KeywordEmbeddingProvider::new(64)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .expect("pipeline");
    pipeline.create_collection("docs").await.expect("collection");
    let pipeline = Arc::new(pipeline);
    let orchestrator = ChatOrchestrator::new(pipeline.clone(), Arc::new(llm), ChatConfig::default());
    let app = app_router(AppState::new(pipeline, Arc::new(orchestrator)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

fn text_file(filename: &str, content: &str) -> Value {
    json!({"filename": filename, "content_base64": STANDARD.encode(content)})
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let created: Value = client
        .post(format!("{}/api/sessions", base))
        .send()
        .await
        .expect("session create response")
        .json()
        .await
        .expect("session json");
    created.get("session_id").and_then(Value::as_str).expect("session_id field").to_string()
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, handle) = spawn_server(MockLlm::new("unused")).await;
    let body: Value = reqwest::get(format!("{}/health", base)).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
    handle.abort();
}

#[tokio::test]
async fn index_serves_the_chat_page() {
    let (base, handle) = spawn_server(MockLlm::new("unused")).await;
    let page = reqwest::get(&base).await.unwrap().text().await.unwrap();
    assert!(page.contains("/api/documents"));
    handle.abort();
}

#[tokio::test]
async fn upload_then_ask_returns_cited_answer() {
    let (base, handle) = spawn_server(MockLlm::new("The sky is blue [1].")).await;
    let client = reqwest::Client::new();

    let upload = client
        .post(format!("{}/api/documents", base))
        .json(&json!({"files": [
            text_file("colors.txt", "The sky is blue."),
            text_file("plants.txt", "Grass grows green."),
        ]}))
        .send()
        .await
        .expect("upload response");
    assert!(upload.status().is_success());
    let stored: Value = upload.json().await.unwrap();
    assert_eq!(stored, json!({"files": 2, "chunks": 2}));

    let session_id = create_session(&client, &base).await;
    let reply = client
        .post(format!("{}/api/sessions/{}/messages", base, session_id))
        .json(&json!({"message": "What color is the sky?"}))
        .send()
        .await
        .expect("message response");
    assert!(reply.status().is_success());
    let reply: Value = reply.json().await.unwrap();
    assert_eq!(reply["answer"], "The sky is blue [1].\n\nSources: colors.txt");
    assert_eq!(reply["sources"], json!(["colors.txt"]));
    assert_eq!(reply["phase"], "awaiting_input");

    let session: Value = client
        .get(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["phase"], "awaiting_input");
    assert_eq!(session["history"][0], json!({"role": "user", "content": "What color is the sky?"}));
    assert_eq!(session["history"][1]["role"], "assistant");

    handle.abort();
}

#[tokio::test]
async fn asking_before_upload_is_a_conflict() {
    let (base, handle) = spawn_server(MockLlm::new("unused")).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let reply = client
        .post(format!("{}/api/sessions/{}/messages", base, session_id))
        .json(&json!({"message": "Anything?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(reply.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = reply.json().await.unwrap();
    assert_eq!(body["kind"], "retrieval");
    assert!(body["error"].as_str().unwrap().contains("upload documents first"));

    let session: Value = client
        .get(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["phase"], "failed");
    assert_eq!(session["history"], json!([]));

    handle.abort();
}

#[tokio::test]
async fn generation_failure_is_bad_gateway_and_retry_succeeds() {
    let llm = MockLlm::new("Blue [1].").then_fail("503 Service Unavailable");
    let (base, handle) = spawn_server(llm).await;
    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/documents", base))
        .json(&json!({"files": [text_file("colors.txt", "The sky is blue.")]}))
        .send()
        .await
        .unwrap();
    let session_id = create_session(&client, &base).await;
    let url = format!("{}/api/sessions/{}/messages", base, session_id);

    let failed = client.post(&url).json(&json!({"message": "Sky?"})).send().await.unwrap();
    assert_eq!(failed.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = failed.json().await.unwrap();
    assert_eq!(body["kind"], "generation");

    let retried = client.post(&url).json(&json!({"message": "Sky?"})).send().await.unwrap();
    assert!(retried.status().is_success());
    let session: Value = client
        .get(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["history"].as_array().map(Vec::len), Some(2));

    handle.abort();
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (base, handle) = spawn_server(MockLlm::new("unused")).await;
    let reply = reqwest::Client::new()
        .post(format!("{}/api/sessions/nope/messages", base))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(reply.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = reply.json().await.unwrap();
    assert_eq!(body["kind"], "not_found");
    handle.abort();
}

#[tokio::test]
async fn deleted_session_is_not_found() {
    let (base, handle) = spawn_server(MockLlm::new("unused")).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    let url = format!("{}/api/sessions/{}", base, session_id);

    let deleted = client.delete(&url).send().await.unwrap();
    assert_eq!(deleted.status(), reqwest::StatusCode::NO_CONTENT);

    let fetched = client.get(&url).send().await.unwrap();
    assert_eq!(fetched.status(), reqwest::StatusCode::NOT_FOUND);

    let again = client.delete(&url).send().await.unwrap();
    assert_eq!(again.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = again.json().await.unwrap();
    assert_eq!(body["kind"], "not_found");

    handle.abort();
}

#[tokio::test]
async fn bad_uploads_are_rejected() {
    let (base, handle) = spawn_server(MockLlm::new("unused")).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/documents", base);

    let cases = [
        (json!({"files": []}), "bad_request"),
        (json!({"files": [{"filename": "a.txt", "content_base64": "***"}]}), "bad_request"),
        (json!({"files": [text_file("photo.jpg", "pixels")]}), "ingestion"),
        (json!({"files": [text_file("broken.pdf", "not a pdf")]}), "ingestion"),
    ];
    for (body, kind) in cases {
        let reply = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(reply.status(), reqwest::StatusCode::BAD_REQUEST);
        let error: Value = reply.json().await.unwrap();
        assert_eq!(error["kind"], kind);
    }

    handle.abort();
}
