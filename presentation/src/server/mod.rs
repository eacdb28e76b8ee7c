//! Axum HTTP surface for chat and recurring jobs.
//!
//! Routes:
//!
//! - `GET  /api/health`
//! - `GET  /api/agents?identity=`
//! - `POST /api/chat` (synchronous `done` / `failed` JSON)
//! - `POST /api/chat/stream` (SSE, one JSON event per frame)
//! - `GET  /api/jobs`
//! - `POST /api/jobs/{id}/fire`
//!
//! Dropping an SSE connection drops the underlying dispatch stream, which
//! cancels the running agent.

pub mod types;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use chrono::Utc;
use relay_application::{
    DispatchStream, FireJobUseCase, FireOutcome, JobStore, RouteOptions, RouteTaskUseCase,
    SkipReason,
};
use relay_domain::{DispatchResult, JobId, RecurringJob, StreamEvent};
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use types::{AgentsQuery, AgentsResponse, ChatRequest, ErrorResponse, FireResponse, HealthResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Shared state for all handlers.
pub struct ServerState {
    pub router: Arc<RouteTaskUseCase>,
    /// Absent when the server runs without a scheduler.
    pub jobs: Option<Arc<dyn JobStore>>,
    pub fire: Option<Arc<FireJobUseCase>>,
    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
}

impl ServerState {
    pub fn new(router: Arc<RouteTaskUseCase>) -> Self {
        Self {
            router,
            jobs: None,
            fire: None,
            keep_alive: Duration::from_secs(30),
        }
    }

    pub fn with_jobs(mut self, jobs: Arc<dyn JobStore>, fire: Arc<FireJobUseCase>) -> Self {
        self.jobs = Some(jobs);
        self.fire = Some(fire);
        self
    }

    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval.max(Duration::from_secs(1));
        self
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/agents", get(agents_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .route("/api/jobs", get(jobs_list_handler))
        .route("/api/jobs/{id}/fire", post(jobs_fire_handler))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<ServerState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

// --- Health ---

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// --- Agents ---

async fn agents_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<AgentsQuery>,
) -> Json<AgentsResponse> {
    let identity = query.identity();
    let agents = state.router.catalog().available_for(identity.as_ref()).await;
    Json(AgentsResponse { agents })
}

// --- Chat ---

async fn chat_handler(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<DispatchResult>, ApiError> {
    let task = req
        .into_task()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(state.router.execute(&task, RouteOptions::default()).await))
}

async fn chat_stream_handler(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>> + Send + 'static>, ApiError>
{
    let task = req
        .into_task()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let stream = state.router.start(&task, RouteOptions::default()).await;

    Ok(Sse::new(event_stream(stream)).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}

/// Forward dispatch events as SSE frames, ending after the terminal event.
fn event_stream(
    stream: DispatchStream,
) -> impl futures::Stream<Item = Result<Event, Infallible>> + Send + 'static {
    futures::stream::unfold(Some(stream), |state| async move {
        let mut stream = state?;
        let event = stream.next().await?;
        let next = if event.is_terminal() {
            None
        } else {
            Some(stream)
        };
        Some((Ok(sse_event(&event)), next))
    })
}

fn sse_event(event: &StreamEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().event(event.kind()).data(data)
}

// --- Jobs ---

#[derive(Serialize)]
struct JobsResponse {
    jobs: Vec<RecurringJob>,
}

async fn jobs_list_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<JobsResponse>, ApiError> {
    let jobs = state.jobs.as_ref().ok_or_else(|| {
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Scheduler not configured")
    })?;
    let jobs = jobs
        .list_jobs()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(JobsResponse { jobs }))
}

async fn jobs_fire_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<FireResponse>), ApiError> {
    let fire = state.fire.as_ref().ok_or_else(|| {
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Scheduler not configured")
    })?;

    let job_id = JobId::new(id);
    let outcome = fire.fire_now(&job_id, Utc::now()).await.map_err(|e| {
        warn!(job_id = %job_id, error = %e, "Manual fire failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    debug!(job_id = %job_id, outcome = ?outcome, "Manual fire finished");

    let status = match &outcome {
        FireOutcome::Delivered(_) => StatusCode::OK,
        FireOutcome::Skipped(SkipReason::NotFound) => StatusCode::NOT_FOUND,
        FireOutcome::Skipped(SkipReason::Locked) => StatusCode::CONFLICT,
        FireOutcome::Skipped(_) => StatusCode::OK,
        FireOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    };
    Ok((status, Json(FireResponse::from(outcome))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_application::{
        Agent, AgentCatalog, AgentClassifier, AgentError, AgentOutput, AgentSelector,
        CatalogParams, ClassifierError, DispatchParams, Dispatcher, SelectionParams,
    };
    use relay_application::ExecutionHandle;
    use relay_domain::{AgentDescriptor, AgentOrigin, Classification, ExecutionEvent, Message};
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    struct Echo {
        descriptor: AgentDescriptor,
    }

    #[async_trait]
    impl Agent for Echo {
        fn descriptor(&self) -> &AgentDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, messages: &[Message]) -> Result<AgentOutput, AgentError> {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(AgentOutput::text(format!("echo: {}", last)))
        }
    }

    /// Streams deltas until its execution is cancelled.
    struct Ticker {
        descriptor: AgentDescriptor,
        token: Mutex<Option<CancellationToken>>,
    }

    #[async_trait]
    impl Agent for Ticker {
        fn descriptor(&self) -> &AgentDescriptor {
            &self.descriptor
        }

        fn supports_streaming(&self) -> bool {
            true
        }

        async fn invoke(&self, _messages: &[Message]) -> Result<AgentOutput, AgentError> {
            Err(AgentError::Unavailable("streaming only".to_string()))
        }

        async fn stream(&self, _messages: &[Message]) -> Result<ExecutionHandle, AgentError> {
            let (tx, rx) = mpsc::channel(8);
            let token = CancellationToken::new();
            *self.token.lock().unwrap() = Some(token.clone());
            tokio::spawn(async move {
                while tx.send(ExecutionEvent::Delta("tick ".to_string())).await.is_ok() {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            });
            Ok(ExecutionHandle::new(rx, token))
        }
    }

    struct Always;

    #[async_trait]
    impl AgentClassifier for Always {
        async fn classify(
            &self,
            _task: &str,
            _candidates: &[AgentDescriptor],
        ) -> Result<Classification, ClassifierError> {
            Ok(Classification::Chosen {
                agent: "general".to_string(),
                rationale: "only agent".to_string(),
            })
        }
    }

    fn general() -> AgentDescriptor {
        AgentDescriptor::new("general", "General assistant", AgentOrigin::Core).unwrap()
    }

    async fn spawn_server() -> String {
        spawn_server_with(Arc::new(Echo {
            descriptor: general(),
        }))
        .await
    }

    async fn spawn_server_with(agent: Arc<dyn Agent>) -> String {
        let catalog = Arc::new(AgentCatalog::new(CatalogParams::default()));
        catalog.register_instance(agent);
        let selector = Arc::new(AgentSelector::new(
            catalog.clone(),
            Arc::new(Always),
            SelectionParams::default(),
        ));
        let route = Arc::new(RouteTaskUseCase::new(
            catalog,
            selector,
            Dispatcher::new(DispatchParams::default()),
        ));
        let state = Arc::new(ServerState::new(route));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state, std::future::pending()));
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let base = spawn_server().await;
        let body: serde_json::Value = reqwest::get(format!("{}/api/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn agents_lists_available_descriptors() {
        let base = spawn_server().await;
        let body: serde_json::Value = reqwest::get(format!("{}/api/agents?identity=alice", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["agents"][0]["name"], "general");
    }

    #[tokio::test]
    async fn chat_returns_terminal_result() {
        let base = spawn_server().await;
        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("{}/api/chat", base))
            .json(&serde_json::json!({"content": "hello"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["type"], "done");
        assert_eq!(body["text"], "echo: hello");
        assert_eq!(body["agent"], "general");
    }

    #[tokio::test]
    async fn chat_rejects_empty_content() {
        let base = spawn_server().await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/chat", base))
            .json(&serde_json::json!({"content": ""}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn stream_emits_sse_frames_and_ends() {
        let base = spawn_server().await;
        let body = reqwest::Client::new()
            .post(format!("{}/api/chat/stream", base))
            .json(&serde_json::json!({"content": "hello"}))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let synthesis = body.find(r#""type":"synthesis-complete""#).unwrap();
        let done = body.find(r#""type":"done""#).unwrap();
        assert!(synthesis < done);
        assert!(body.contains("echo: hello"));
    }

    #[tokio::test]
    async fn dropped_connection_cancels_agent() {
        let ticker = Arc::new(Ticker {
            descriptor: general(),
            token: Mutex::new(None),
        });
        let base = spawn_server_with(ticker.clone()).await;

        let client = reqwest::Client::new();
        let mut response = client
            .post(format!("{}/api/chat/stream", base))
            .json(&serde_json::json!({"content": "count forever"}))
            .send()
            .await
            .unwrap();
        let first = response.chunk().await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&first).contains("content-delta"));

        let token = ticker.token.lock().unwrap().clone().unwrap();
        assert!(!token.is_cancelled());

        drop(response);
        drop(client);
        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("agent execution was not cancelled");
    }

    #[tokio::test]
    async fn jobs_routes_need_a_scheduler() {
        let base = spawn_server().await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/jobs/daily-joke/fire", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 503);
    }
}
