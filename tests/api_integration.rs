//! Integration tests for the HTTP API
//!
//! Drives the router with `oneshot` and the scheduler by hand via `tick_all`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use debattle::core::{create_router, DebateService, JudgeService, MemoryStore, RoutingTranscriber};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_service() -> DebateService {
    DebateService::new(
        MemoryStore::new().shared(),
        Arc::new(RoutingTranscriber::default()),
        JudgeService::heuristic_only(),
    )
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Create a fast single-speaker debate and return its id
async fn create_fast(app: &Router) -> String {
    let (status, json) = call(
        app,
        "POST",
        "/debate/new",
        Some(json!({
            "topic": "X should be banned",
            "teamSize": 1,
            "discussionSecs": 1,
            "speechSecs": 30,
            "conclusionSecs": 1,
            "interruptionAskSecs": 5,
            "interruptionEarlyWindowSecs": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["snapshot"]["phase"], "LOBBY");
    json["debateId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(test_service());
    let (status, json) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["debatesActive"], 0);
}

#[tokio::test]
async fn test_create_and_fetch() {
    let app = create_router(test_service());
    let id = create_fast(&app).await;

    let (status, json) = call(&app, "GET", &format!("/debate/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config"]["speechSecs"], 30);

    let (status, json) = call(&app, "GET", &format!("/debate/{}/snapshot", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["debateId"], id.as_str());
    assert_eq!(json["interruptionsLeft"]["A"], 2);
}

#[tokio::test]
async fn test_bad_config_is_400() {
    let app = create_router(test_service());
    let (status, json) = call(
        &app,
        "POST",
        "/debate/new",
        Some(json!({"topic": "t", "teamSize": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_config");
}

#[tokio::test]
async fn test_unknown_debate_is_404() {
    let app = create_router(test_service());
    let (status, json) = call(&app, "POST", "/debate/nope/start", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "session_not_found");
}

#[tokio::test]
async fn test_start_twice_conflicts() {
    let app = create_router(test_service());
    let id = create_fast(&app).await;
    let (status, json) = call(&app, "POST", &format!("/debate/{}/start", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "TEAM_DISCUSS");

    let (status, json) = call(&app, "POST", &format!("/debate/{}/start", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "invalid_phase");
}

#[tokio::test]
async fn test_speech_and_interruption_flow() {
    let service = test_service();
    let app = create_router(service.clone());
    let id = create_fast(&app).await;
    call(&app, "POST", &format!("/debate/{}/start", id), None).await;
    service.tick_all().await;

    // B cannot speak during A's speech
    let (status, json) = call(
        &app,
        "POST",
        &format!("/debate/{}/speech", id),
        Some(json!({"team": "B", "phase": "SPEECH_A", "source": "text:No."})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "invalid_floor");

    let (status, json) = call(
        &app,
        "POST",
        &format!("/debate/{}/speech", id),
        Some(json!({"team": "A", "phase": "SPEECH_A", "source": "text:The issue is X."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "The issue is X.");
    assert_eq!(json["durationMs"], 1600);

    let (status, json) = call(
        &app,
        "POST",
        &format!("/debate/{}/interrupt", id),
        Some(json!({"team": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "INTERRUPTION_ASK");
    assert_eq!(json["interruptionsLeft"]["B"], 1);

    let (status, json) = call(
        &app,
        "POST",
        &format!("/debate/{}/interrupt/ask", id),
        Some(json!({"team": "B", "source": "text:Which X?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["accepted"], true);

    let (status, json) = call(&app, "POST", &format!("/debate/{}/interrupt/end", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "SPEECH_A");
    assert_eq!(json["remaining"], 30);

    let (status, json) = call(&app, "POST", &format!("/debate/{}/interrupt/reject", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "no_interruption_pending");
}

#[tokio::test]
async fn test_unknown_audio_handle_is_502() {
    let service = test_service();
    let app = create_router(service.clone());
    let id = create_fast(&app).await;
    call(&app, "POST", &format!("/debate/{}/start", id), None).await;
    service.tick_all().await;

    let (status, json) = call(
        &app,
        "POST",
        &format!("/debate/{}/speech", id),
        Some(json!({"team": "A", "phase": "SPEECH_A", "source": "s3://clip.wav"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "transcription_failure");
    assert_eq!(service.state(&id).await.unwrap().audio_turns().len(), 0);
}

#[tokio::test]
async fn test_debate_runs_to_verdict() {
    let service = test_service();
    let app = create_router(service.clone());
    let id = create_fast(&app).await;

    let (status, _) = call(&app, "POST", &format!("/debate/{}/judge", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    call(&app, "POST", &format!("/debate/{}/start", id), None).await;
    // 1 + 30 + 30 + 1 + 1 seconds to JUDGING
    for _ in 0..63 {
        service.tick_all().await;
    }

    let (status, json) = call(&app, "POST", &format!("/debate/{}/judge", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "heuristic");
    assert_eq!(json["winner"], "TIE");

    let (status, json) = call(&app, "GET", &format!("/debate/{}/judgment", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["complete"], true);

    let (_, json) = call(&app, "GET", &format!("/debate/{}/snapshot", id), None).await;
    assert_eq!(json["phase"], "COMPLETE");
}

#[tokio::test]
async fn test_close_debate() {
    let app = create_router(test_service());
    let id = create_fast(&app).await;
    let (status, json) = call(&app, "DELETE", &format!("/debate/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, _) = call(&app, "GET", &format!("/debate/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
