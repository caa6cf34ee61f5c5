#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{patch, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use pawlens_analyzer::{
    ai_client::{AiServiceError, SkinAnalyzer},
    models::{DiagnosisRecord, DiagnosisResult},
    repository::{DiagnosisRepository, MemoryRepository, RepositoryError},
};

pub const ATOPIC_REPLY: &str = "Disease: Atopic Dermatitis. Severity: moderate. Veterinary consultation: possible allergy testing needed. Treatment: antihistamines. Home remedies: oatmeal baths.";

/// What the stub analyzer answers with.
#[derive(Clone)]
pub enum Outcome {
    Reply(String),
    RateLimited,
    QuotaExceeded,
    Status(u16),
}

pub struct StubAnalyzer {
    outcome: Outcome,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self { outcome, calls: AtomicUsize::new(0) })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Outcome::Reply(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SkinAnalyzer for StubAnalyzer {
    async fn analyze(&self, _image_url: &str, _problem_description: &str) -> Result<String, AiServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Reply(text) => Ok(text.clone()),
            Outcome::RateLimited => Err(AiServiceError::RateLimited),
            Outcome::QuotaExceeded => Err(AiServiceError::QuotaExceeded),
            Outcome::Status(s) => Err(AiServiceError::Service { status: Some(*s), body: "upstream failure".into() }),
        }
    }
}

/// Repository whose writes always fail, counting the failed-status attempts.
#[derive(Default)]
pub struct BrokenRepository {
    pub mark_failed_calls: AtomicUsize,
}

#[async_trait]
impl DiagnosisRepository for BrokenRepository {
    async fn complete(&self, _id: Uuid, _result: &DiagnosisResult) -> Result<(), RepositoryError> {
        Err(RepositoryError::Http { status: 503, body: "database unavailable".into() })
    }

    async fn mark_failed(&self, _id: Uuid, _note: &str) -> Result<(), RepositoryError> {
        self.mark_failed_calls.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::Http { status: 503, body: "database unavailable".into() })
    }

    async fn fetch(&self, _id: Uuid) -> Result<Option<DiagnosisRecord>, RepositoryError> {
        Err(RepositoryError::Transport("connection refused".into()))
    }
}

/// A memory store holding one pending record, as the upload flow would leave it.
pub fn seeded_repository() -> (MemoryRepository, Uuid) {
    let repo = MemoryRepository::new();
    let id = Uuid::new_v4();
    repo.insert(DiagnosisRecord::pending(id, "https://x/img.jpg", "red itchy patches"));
    (repo, id)
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct GatewayState {
    status: StatusCode,
    reply: Value,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn chat_completions(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.captured.lock().push(CapturedRequest { authorization, body });
    (state.status, Json(state.reply.clone()))
}

/// Starts a throwaway chat-completions endpoint; returns its base URL and the requests it saw.
pub async fn spawn_gateway(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = GatewayState { status, reply, captured: captured.clone() };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), captured)
}

pub fn completion(content: &str) -> Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

#[derive(Debug, Clone)]
pub struct CapturedRestCall {
    pub method: Method,
    pub query: String,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub prefer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct RestState {
    status: StatusCode,
    reply: String,
    captured: Arc<Mutex<Vec<CapturedRestCall>>>,
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn diagnoses_table(
    State(state): State<RestState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.captured.lock().push(CapturedRestCall {
        method,
        query: query.unwrap_or_default(),
        apikey: header_text(&headers, "apikey"),
        authorization: header_text(&headers, "authorization"),
        prefer: header_text(&headers, "prefer"),
        body: serde_json::from_str(&body).ok(),
    });
    (state.status, state.reply.clone())
}

/// Starts a throwaway PostgREST `diagnoses` table answering every call with `status` and `reply`.
/// Returns the project URL (without `/rest/v1`) and the calls it saw.
pub async fn spawn_postgrest(status: StatusCode, reply: &str) -> (String, Arc<Mutex<Vec<CapturedRestCall>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = RestState { status, reply: reply.to_string(), captured: captured.clone() };
    let app = Router::new()
        .route("/rest/v1/diagnoses", patch(diagnoses_table).get(diagnoses_table))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}
