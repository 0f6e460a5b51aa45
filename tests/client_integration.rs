//! Integration tests for the HTTP clients
//!
//! Runs a local mock of the recognition and backend services

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use gesture_quest::core::{
    CatalogClient, Frame, GestureClient, GestureNormalizer, HttpProgressSink, ProgressSink,
    Recognizer,
};
use gesture_quest::types::{ProgressRecord, Subject};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Mock {
    images: Mutex<Vec<String>>,
    progress: Mutex<Vec<Value>>,
}

async fn process_gesture(State(mock): State<Arc<Mock>>, Json(body): Json<Value>) -> Json<Value> {
    let image = body["image_data"].as_str().unwrap_or_default().to_string();
    mock.images.lock().unwrap().push(image);
    Json(json!({
        "hands_detected": 1,
        "gestures": [{"type": "pour", "confidence": 0.8, "direction": "right"}],
        "palm_center": [[0.2, 0.5, 0.0]],
        "fingertip_positions": [{"index": [0.25, 0.3, 0.0]}],
        "landmarks": [],
        "bounding_boxes": []
    }))
}

async fn games() -> Json<Value> {
    Json(json!([
        {"id": 11, "subject": "physics", "title": "Physics Puzzle", "difficulty": "beginner"},
        {"id": 15, "subject": "computer_science", "title": "Coding Challenge"}
    ]))
}

async fn progress(State(mock): State<Arc<Mock>>, Json(body): Json<Value>) -> StatusCode {
    mock.progress.lock().unwrap().push(body);
    StatusCode::OK
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_mock() -> (String, Arc<Mock>) {
    let mock = Arc::new(Mock::default());
    let router = Router::new()
        .route("/process-gesture/", post(process_gesture))
        .route("/games/", get(games))
        .route("/progress/", post(progress))
        .with_state(Arc::clone(&mock));
    (spawn(router).await, mock)
}

async fn spawn_broken() -> String {
    let router = Router::new()
        .route("/process-gesture/", post(broken))
        .route("/games/", get(broken))
        .route("/progress/", post(broken));
    spawn(router).await
}

#[tokio::test]
async fn test_classify_posts_data_url() {
    let (base, mock) = spawn_mock().await;
    let client = GestureClient::new(format!("{}/", base), Duration::from_secs(2)).unwrap();
    assert_eq!(client.endpoint(), format!("{}/process-gesture/", base));

    let frame = Frame::new(vec![1, 2, 3], "image/jpeg");
    let report = client.classify(&frame).await.unwrap();
    let event = GestureNormalizer::default().normalize(&report);

    assert_eq!(event.hands_detected, 1);
    assert_eq!(mock.images.lock().unwrap().as_slice(), ["data:image/jpeg;base64,AQID"]);
}

#[tokio::test]
async fn test_classify_server_error_is_recognition_error() {
    let base = spawn_broken().await;
    let client = GestureClient::new(base, Duration::from_secs(2)).unwrap();

    let err = client
        .classify(&Frame::new(vec![0], "image/png"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RECOGNITION_ERROR");
}

#[tokio::test]
async fn test_catalog_fetch() {
    let (base, _) = spawn_mock().await;
    let client = CatalogClient::new(base, Duration::from_secs(2)).unwrap();

    let games = client.fetch().await.unwrap();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].id, 11);
    assert_eq!(games[1].subject(), Some(Subject::Coding));
    assert_eq!(games[1].description, "");
}

#[tokio::test]
async fn test_catalog_falls_back_to_builtin() {
    let base = spawn_broken().await;
    let client = CatalogClient::new(base, Duration::from_secs(2)).unwrap();

    assert_eq!(client.fetch().await.unwrap_err().code(), "CATALOG_ERROR");
    let games = client.fetch_or_builtin().await;
    assert_eq!(games.len(), 5);
}

#[tokio::test]
async fn test_progress_upload() {
    let (base, mock) = spawn_mock().await;
    let sink = HttpProgressSink::new(base, Duration::from_secs(2)).unwrap();
    let record = ProgressRecord {
        user_id: 1,
        game_id: 3,
        score: 15,
        time_spent: 42,
        completed: true,
        gestures_used: json!({"counts": {"pour": 3}}),
        game_specific_data: Some(json!({"type": "reaction"})),
        recorded_at: Utc::now(),
    };

    sink.send(&record).await.unwrap();
    let uploads = mock.progress.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0]["game_id"], 3);
    assert_eq!(uploads[0]["time_spent"], 42);
    assert_eq!(uploads[0]["game_specific_data"]["type"], "reaction");
}

#[tokio::test]
async fn test_submitted_progress_lands_after_flush() {
    let (base, mock) = spawn_mock().await;
    let sink = HttpProgressSink::new(base, Duration::from_secs(2)).unwrap();
    for score in [10, 20] {
        sink.submit(ProgressRecord {
            user_id: 4,
            game_id: 1,
            score,
            time_spent: 3,
            completed: true,
            gestures_used: json!({}),
            game_specific_data: None,
            recorded_at: Utc::now(),
        });
    }

    sink.flush(Duration::from_secs(5)).await;
    let mut scores: Vec<u64> = mock
        .progress
        .lock()
        .unwrap()
        .iter()
        .filter_map(|r| r["score"].as_u64())
        .collect();
    scores.sort();
    assert_eq!(scores, vec![10, 20]);
}

#[tokio::test]
async fn test_progress_upload_failure_is_persistence_error() {
    let base = spawn_broken().await;
    let sink = HttpProgressSink::new(base, Duration::from_secs(2)).unwrap();
    let record = ProgressRecord {
        user_id: 1,
        game_id: 1,
        score: 10,
        time_spent: 1,
        completed: true,
        gestures_used: json!({}),
        game_specific_data: None,
        recorded_at: Utc::now(),
    };

    let err = sink.send(&record).await.unwrap_err();
    assert_eq!(err.code(), "PERSISTENCE_ERROR");
}
