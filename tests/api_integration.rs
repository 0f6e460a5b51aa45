//! Integration tests for the play server
//!
//! Tests API endpoints against a single in-process router

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gesture_quest::core::{
    builtin_catalog, create_router, AppState, GameRegistry, MemoryProgressSink,
};
use gesture_quest::types::Language;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_router() -> Router {
    let state = AppState::new(GameRegistry::default(), builtin_catalog(), Language::English);
    create_router(Arc::new(state))
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

fn drag_report(x: f64, y: f64) -> Value {
    json!({
        "hands_detected": 1,
        "gestures": [{"type": "drag", "confidence": 0.9}],
        "palm_center": [[x, y]]
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = call(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["active_subject"].is_null());
}

#[tokio::test]
async fn test_games_catalog() {
    let app = create_test_router();
    let (status, json) = call(&app, "GET", "/games", None).await;

    assert_eq!(status, StatusCode::OK);
    let games = json.as_array().unwrap();
    assert_eq!(games.len(), 5);
    assert_eq!(games[4]["subject"], "computer_science");
}

#[tokio::test]
async fn test_play_requires_a_session() {
    let app = create_test_router();

    let (status, json) = call(&app, "GET", "/play", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "NO_ACTIVE_SESSION");

    let (status, _) = call(&app, "POST", "/play/report", Some(drag_report(0.5, 0.5))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_subject() {
    let app = create_test_router();
    let (status, json) = call(&app, "POST", "/play", Some(json!({"subject": "astronomy"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "UNKNOWN_SUBJECT");
}

#[tokio::test]
async fn test_start_play_and_health_reports_subject() {
    let app = create_test_router();
    let (status, json) = call(&app, "POST", "/play", Some(json!({"subject": "chemistry"}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["subject"], "chemistry");
    assert_eq!(json["score"], 0);
    assert_eq!(json["phase"], "IDLE");
    assert_eq!(json["entities"]["beakers"].as_array().unwrap().len(), 3);

    let (_, health) = call(&app, "GET", "/health", None).await;
    assert_eq!(health["active_subject"], "chemistry");
}

#[tokio::test]
async fn test_reports_drive_physics_to_a_score() {
    let sink = MemoryProgressSink::new();
    let state = AppState::new(GameRegistry::default(), builtin_catalog(), Language::Hindi)
        .with_user(3)
        .with_sink(Arc::new(sink.clone()));
    let app = create_router(Arc::new(state));

    call(&app, "POST", "/play", Some(json!({"subject": "physics"}))).await;

    let (status, json) = call(&app, "POST", "/play/report", Some(drag_report(0.125, 0.2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["event"]["hands_detected"], 1);
    assert_eq!(json["snapshot"]["phase"], "INTERACTING");

    let (_, json) = call(&app, "POST", "/play/report", Some(drag_report(0.75, 0.5))).await;
    assert_eq!(json["effects"][0]["type"], "scored");
    assert_eq!(json["effects"][0]["outcome"], "target_hit");
    assert_eq!(json["snapshot"]["score"], 10);
    assert_eq!(json["snapshot"]["phase"], "COMPLETED");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, 3);
    assert_eq!(records[0].game_id, 1);
}

#[tokio::test]
async fn test_action_for_wrong_subject_is_unprocessable() {
    let app = create_test_router();
    call(&app, "POST", "/play", Some(json!({"subject": "physics"}))).await;

    let (status, json) = call(&app, "POST", "/play/action", Some(json!({"action": "run_program"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INVALID_CHALLENGE_STATE");
}

#[tokio::test]
async fn test_coding_actions() {
    let app = create_test_router();
    call(&app, "POST", "/play", Some(json!({"subject": "computer_science"}))).await;

    let (status, json) = call(
        &app,
        "POST",
        "/play/action",
        Some(json!({"action": "append_block", "block": "move_forward"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["subject"], "coding");

    let (_, json) = call(&app, "POST", "/play/action", Some(json!({"action": "run_program"}))).await;
    assert_eq!(json["effects"][0]["type"], "attempt_failed");
    assert_eq!(json["snapshot"]["score"], 0);
}

#[tokio::test]
async fn test_end_play_returns_to_game_list() {
    let app = create_test_router();
    call(&app, "POST", "/play", Some(json!({"subject": "biology"}))).await;

    let (status, _) = call(&app, "DELETE", "/play", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", "/play", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "DELETE", "/play", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
