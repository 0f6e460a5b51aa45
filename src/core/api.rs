//! HTTP + WebSocket play server
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /games - Game catalog
//! - POST /play - Start a session for a subject (replaces the active one)
//! - GET /play - Snapshot of the active session
//! - DELETE /play - Back to the game list
//! - POST /play/report - Raw recognizer report for the active session
//! - POST /play/action - Player action (button / click) for the active session
//! - WS /ws - Live side effects

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::core::{
    find_game, FeedbackChannel, GameRegistry, GameSession, GestureNormalizer, PlayerAction,
    ProgressContext, ProgressSink, SessionClock, SilentAnnouncer,
};
use crate::types::{
    EngineError, GameDescriptor, GestureTally, InteractionEvent, Language, SessionSnapshot,
    SideEffect, Subject,
};

/// The one session the server is playing
pub struct ActivePlay {
    pub game: GameDescriptor,
    pub session: Box<dyn GameSession>,
    pub feedback: FeedbackChannel,
    pub tally: GestureTally,
    pub clock: SessionClock,
}

impl ActivePlay {
    fn dispatch(&mut self, effects: &[SideEffect]) {
        let now = self.clock.now();
        let context = ProgressContext {
            time_spent_secs: now / 1000,
            gestures_used: self.tally.to_value(),
        };
        for effect in effects {
            self.feedback.dispatch(effect, &context, now);
        }
    }
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
pub struct PlayUpdate {
    pub effects: Vec<SideEffect>,
    pub snapshot: SessionSnapshot,
}

/// App state
pub struct AppState {
    pub play: Mutex<Option<ActivePlay>>,
    pub registry: GameRegistry,
    pub catalog: Vec<GameDescriptor>,
    pub normalizer: GestureNormalizer,
    pub language: Language,
    pub user_id: u32,
    pub sink: Option<Arc<dyn ProgressSink>>,
    pub update_tx: broadcast::Sender<PlayUpdate>,
}

impl AppState {
    pub fn new(registry: GameRegistry, catalog: Vec<GameDescriptor>, language: Language) -> Self {
        let (update_tx, _) = broadcast::channel(100);
        Self {
            play: Mutex::new(None),
            registry,
            catalog,
            normalizer: GestureNormalizer::default(),
            language,
            user_id: 1,
            sink: None,
            update_tx,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_user(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }
}

/// Start session request
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub subject: String,
    pub language: Option<Language>,
}

/// Report / action response
#[derive(Debug, Serialize)]
pub struct StepResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<InteractionEvent>,
    pub effects: Vec<SideEffect>,
    pub snapshot: SessionSnapshot,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_subject: Option<Subject>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

fn no_session() -> Response {
    error(StatusCode::CONFLICT, "NO_ACTIVE_SESSION", "select a game first")
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::InvalidChallengeState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Catalog(_) | EngineError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        error(status, self.code(), self.to_string())
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/games", get(list_games))
        .route("/play", post(start_play).get(get_play).delete(end_play))
        .route("/play/report", post(submit_report))
        .route("/play/action", post(submit_action))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let play = state.play.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        active_subject: play.as_ref().map(|p| p.session.subject()),
    })
}

async fn list_games(State(state): State<Arc<AppState>>) -> Json<Vec<GameDescriptor>> {
    Json(state.catalog.clone())
}

/// Start a session; any previous session is destroyed
async fn start_play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Response {
    let Some(subject) = Subject::parse(&req.subject) else {
        return error(
            StatusCode::BAD_REQUEST,
            "UNKNOWN_SUBJECT",
            format!("no game for subject '{}'", req.subject),
        );
    };
    let Some(game) = find_game(&state.catalog, subject).cloned() else {
        return EngineError::Catalog(format!("{} is not in the catalog", subject)).into_response();
    };

    let mut feedback = FeedbackChannel::new(
        req.language.unwrap_or(state.language),
        Box::new(SilentAnnouncer),
    )
    .for_game(state.user_id, game.id);
    if let Some(sink) = &state.sink {
        feedback = feedback.with_sink(Box::new(Arc::clone(sink)));
    }

    let mut clock = SessionClock::new();
    clock.resume();
    let active = ActivePlay {
        session: state.registry.create(subject),
        game,
        feedback,
        tally: GestureTally::new(),
        clock,
    };
    let snapshot = active.session.current_state();

    let mut play = state.play.lock().await;
    if let Some(previous) = play.replace(active) {
        debug!(subject = %previous.session.subject(), "previous session destroyed");
    }
    info!(%subject, "play started");
    (StatusCode::CREATED, Json(snapshot)).into_response()
}

async fn get_play(State(state): State<Arc<AppState>>) -> Response {
    let play = state.play.lock().await;
    match play.as_ref() {
        Some(active) => Json(active.session.current_state()).into_response(),
        None => no_session(),
    }
}

/// Back to the game list
async fn end_play(State(state): State<Arc<AppState>>) -> Response {
    let mut play = state.play.lock().await;
    match play.take() {
        Some(active) => {
            info!(subject = %active.session.subject(), score = active.session.core().score(), "play ended");
            StatusCode::NO_CONTENT.into_response()
        }
        None => no_session(),
    }
}

/// Normalize a raw recognizer report and apply it to the active session
async fn submit_report(State(state): State<Arc<AppState>>, Json(raw): Json<Value>) -> Response {
    let mut play = state.play.lock().await;
    let Some(active) = play.as_mut() else {
        return no_session();
    };

    let event = state.normalizer.normalize(&raw);
    active.tally.record(&event);
    let effects = active.session.apply_event(&event, active.clock.now());
    active.dispatch(&effects);

    let snapshot = active.session.current_state();
    broadcast(&state, &effects, &snapshot);
    Json(StepResponse {
        event: Some(event),
        effects,
        snapshot,
    })
    .into_response()
}

async fn submit_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<PlayerAction>,
) -> Response {
    let mut play = state.play.lock().await;
    let Some(active) = play.as_mut() else {
        return no_session();
    };

    let effects = match active.session.perform(&action, active.clock.now()) {
        Ok(effects) => effects,
        Err(e) => {
            warn!(code = e.code(), "{}", e);
            return e.into_response();
        }
    };
    active.dispatch(&effects);

    let snapshot = active.session.current_state();
    broadcast(&state, &effects, &snapshot);
    Json(StepResponse {
        event: None,
        effects,
        snapshot,
    })
    .into_response()
}

fn broadcast(state: &AppState, effects: &[SideEffect], snapshot: &SessionSnapshot) {
    if effects.is_empty() {
        return;
    }
    let _ = state.update_tx.send(PlayUpdate {
        effects: effects.to_vec(),
        snapshot: snapshot.clone(),
    });
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.update_tx.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward updates until either side closes
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<PlayUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            let update = match rx.recv().await {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let json = serde_json::to_string(&update).unwrap_or_default();
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => inbound.abort(),
        _ = &mut inbound => forward.abort(),
    }
}

/// Run the play server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "play server listening");
    println!("✋ Gesture Quest play server on {}", addr);
    println!("  GET    /health       - Health check");
    println!("  GET    /games        - Game catalog");
    println!("  POST   /play         - Start a game");
    println!("  GET    /play         - Session snapshot");
    println!("  DELETE /play         - Back to game list");
    println!("  POST   /play/report  - Recognizer report");
    println!("  POST   /play/action  - Player action");
    println!("  WS     /ws           - Live side effects");
    axum::serve(listener, router).await
}
