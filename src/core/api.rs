//! HTTP + WebSocket API for Debattle
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /debate/new - Create debate
//! - GET /debate/:id - Full session state
//! - GET /debate/:id/snapshot - Realtime snapshot
//! - POST /debate/:id/start - Leave the lobby
//! - POST /debate/:id/interrupt - Request an interruption
//! - POST /debate/:id/interrupt/reject - Speaker declines
//! - POST /debate/:id/interrupt/end - Interrupter done early
//! - POST /debate/:id/interrupt/ask - Submit the interruption question
//! - POST /debate/:id/speech - Submit a speech or conclusion
//! - POST /debate/:id/judge - Judge now / fetch verdict
//! - GET /debate/:id/judgment - Verdict if available
//! - DELETE /debate/:id - Close debate
//! - WS /ws/:id - Events out, commands in

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::core::ingest::{InterruptionAskSubmission, SpeechSubmission};
use crate::core::scheduler::PhaseScheduler;
use crate::core::service::{CreateDebate, DebateService};
use crate::error::EngineError;
use crate::types::{
    AudioTurn, DebateEvent, InterruptionRecord, RealtimeCommand, SessionState, StateSnapshot,
    Team, Verdict,
};

/// App state
pub struct AppState {
    pub service: DebateService,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub debates_active: usize,
}

/// Create debate response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebateResponse {
    pub debate_id: String,
    pub websocket_url: String,
    pub snapshot: StateSnapshot,
}

/// Interruption request
#[derive(Debug, Deserialize)]
pub struct InterruptRequest {
    pub team: Team,
}

/// Judgment lookup response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentResponse {
    pub debate_id: String,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

/// Stable machine-readable name of an error
pub fn error_code(error: &EngineError) -> &'static str {
    match error {
        EngineError::InvalidFloor { .. } => "invalid_floor",
        EngineError::NoInterruptionWindow(_) => "no_interruption_window",
        EngineError::NoInterruptionPending => "no_interruption_pending",
        EngineError::InterruptionDenied(_) => "interruption_denied",
        EngineError::InvalidPhase { .. } => "invalid_phase",
        EngineError::TranscriptionFailure(_) => "transcription_failure",
        EngineError::JudgingProcessFailure(_) => "judging_process_failure",
        EngineError::InvalidConfig(_) => "invalid_config",
        EngineError::SessionNotFound(_) => "session_not_found",
    }
}

fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        EngineError::TranscriptionFailure(_) | EngineError::JudgingProcessFailure(_) => {
            StatusCode::BAD_GATEWAY
        }
        EngineError::InvalidFloor { .. }
        | EngineError::NoInterruptionWindow(_)
        | EngineError::NoInterruptionPending
        | EngineError::InterruptionDenied(_)
        | EngineError::InvalidPhase { .. } => StatusCode::CONFLICT,
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: error_code(&self).to_string(),
        };
        (status_for(&self), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, EngineError>;

/// Create the API router
pub fn create_router(service: DebateService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/health", get(health))
        .route("/debate/new", post(create_debate))
        .route("/debate/:id", get(get_debate).delete(close_debate))
        .route("/debate/:id/snapshot", get(get_snapshot))
        .route("/debate/:id/start", post(start_debate))
        .route("/debate/:id/interrupt", post(request_interrupt))
        .route("/debate/:id/interrupt/reject", post(reject_interrupt))
        .route("/debate/:id/interrupt/end", post(end_interrupt))
        .route("/debate/:id/interrupt/ask", post(submit_ask))
        .route("/debate/:id/speech", post(submit_speech))
        .route("/debate/:id/judge", post(judge_debate))
        .route("/debate/:id/judgment", get(get_judgment))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        debates_active: state.service.list().await.len(),
    })
}

async fn create_debate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDebate>,
) -> ApiResult<(StatusCode, Json<NewDebateResponse>)> {
    let snapshot = state.service.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(NewDebateResponse {
            debate_id: snapshot.debate_id.clone(),
            websocket_url: format!("/ws/{}", snapshot.debate_id),
            snapshot,
        }),
    ))
}

async fn get_debate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionState>> {
    Ok(Json(state.service.state(&id).await?))
}

async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StateSnapshot>> {
    Ok(Json(state.service.snapshot(&id).await?))
}

async fn start_debate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StateSnapshot>> {
    Ok(Json(state.service.start(&id).await?))
}

async fn request_interrupt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InterruptRequest>,
) -> ApiResult<Json<StateSnapshot>> {
    Ok(Json(state.service.request_interrupt(&id, req.team).await?))
}

async fn reject_interrupt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StateSnapshot>> {
    Ok(Json(state.service.reject_interrupt(&id).await?))
}

async fn end_interrupt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StateSnapshot>> {
    Ok(Json(state.service.end_interrupt(&id).await?))
}

async fn submit_ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InterruptionAskSubmission>,
) -> ApiResult<Json<InterruptionRecord>> {
    Ok(Json(state.service.submit_interruption_ask(&id, req).await?))
}

async fn submit_speech(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SpeechSubmission>,
) -> ApiResult<Json<AudioTurn>> {
    Ok(Json(state.service.submit_speech(&id, req).await?))
}

async fn judge_debate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Verdict>> {
    Ok(Json(state.service.judge(&id).await?))
}

async fn get_judgment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JudgmentResponse>> {
    let verdict = state.service.judgment(&id).await?;
    Ok(Json(JudgmentResponse {
        debate_id: id,
        complete: verdict.is_some(),
        verdict,
    }))
}

async fn close_debate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.close(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// WebSocket handler for live updates and commands
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> ApiResult<impl IntoResponse> {
    let rx = state.service.subscribe(&id).await?;
    let snapshot = state.service.snapshot(&id).await?;
    let service = state.service.clone();

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, service, id, snapshot, rx).await;
    }))
}

/// Forward events out, apply commands in, until either side goes away
async fn handle_websocket(
    socket: WebSocket,
    service: DebateService,
    debate_id: String,
    snapshot: StateSnapshot,
    mut rx: broadcast::Receiver<DebateEvent>,
) {
    let (mut sender, mut receiver) = socket.split();
    if send_json(&mut sender, &DebateEvent::State(snapshot)).await.is_err() {
        return;
    }
    tracing::debug!(debate_id = %debate_id, "websocket subscriber connected");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if send_json(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(debate_id = %debate_id, skipped, "websocket subscriber lagging");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = dispatch_command(&service, &debate_id, &text).await {
                        let body = ErrorResponse { error: e.to_string(), code: error_code(&e).to_string() };
                        if send_json(&mut sender, &body).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!(debate_id = %debate_id, "websocket subscriber gone");
}

/// Apply one inbound realtime command
async fn dispatch_command(service: &DebateService, debate_id: &str, text: &str) -> ApiResult<()> {
    let command: RealtimeCommand = serde_json::from_str(text)
        .map_err(|e| EngineError::InvalidConfig(format!("bad command: {}", e)))?;
    match command {
        RealtimeCommand::Start => service.start(debate_id).await?,
        RealtimeCommand::RequestInterrupt { team } => service.request_interrupt(debate_id, team).await?,
        RealtimeCommand::RejectInterrupt => service.reject_interrupt(debate_id).await?,
        RealtimeCommand::EndInterrupt => service.end_interrupt(debate_id).await?,
    };
    Ok(())
}

async fn send_json<S, T>(sender: &mut S, value: &T) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
    T: Serialize,
{
    match serde_json::to_string(value) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            tracing::warn!(error = %e, "unserialisable frame dropped");
            Ok(())
        }
    }
}

/// Run the API server with its phase scheduler until Ctrl-C
pub async fn run_server(
    addr: &str,
    service: DebateService,
    tick: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = PhaseScheduler::spawn(service.clone(), tick);
    let router = create_router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, version = crate::VERSION, "debattle API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler failed");
            }
        })
        .await?;

    scheduler.shutdown().await;
    tracing::info!("debattle API stopped");
    Ok(())
}
