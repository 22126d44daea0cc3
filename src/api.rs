//! HTTP API endpoints.
//!
//! Thin JSON layer over [`AppState`]. The correct key of a question is only
//! included once the game is over.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::session::{GameSession, Outcome};
use crate::state::export::GameStateExport;
use crate::state::AppState;
use crate::types::*;

/// Player endpoints, plus the state snapshot endpoints when
/// `config.state_routes_enabled` is set
pub fn router(state: Arc<AppState>, config: &GameConfig) -> Router {
    let mut app = Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/games", post(create_game))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/answer", post(answer))
        .route("/api/games/{id}/take_money", post(take_money))
        .route("/api/games/{id}/help", post(use_help));

    if config.state_routes_enabled {
        app = app
            .route("/api/state/export", get(export_state))
            .route("/api/state/import", post(import_state));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error body: `{ "code": ..., "msg": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
}

#[derive(Debug)]
pub enum ApiError {
    Game(GameError),
    BadRequest { code: &'static str, msg: String },
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        ApiError::Game(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            ApiError::Game(e) => {
                let status = match e {
                    GameError::GameNotFound(_) | GameError::UserNotFound(_) => {
                        StatusCode::NOT_FOUND
                    }
                    GameError::InactiveSession
                    | GameError::AlreadyUsedHelp(_)
                    | GameError::GameInProgress(_) => StatusCode::CONFLICT,
                    GameError::InsufficientQuestions { .. } => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.code(), e.to_string())
            }
            ApiError::BadRequest { code, msg } => (StatusCode::BAD_REQUEST, code, msg),
        };

        (
            status,
            Json(ErrorBody {
                code: code.to_string(),
                msg,
            }),
        )
            .into_response()
    }
}

// ========== Views ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub level: usize,
    pub text: String,
    pub variants: BTreeMap<AnswerKey, String>,
    pub help: BTreeMap<HelpKind, HelpResult>,
    /// Only present once the game is over
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_key: Option<AnswerKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameView {
    pub id: GameId,
    pub user_id: UserId,
    pub status: GameStatus,
    pub current_level: usize,
    pub prize: u64,
    /// What answering the current question right would be worth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_prize: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub used_help: Vec<HelpKind>,
    pub question: Option<QuestionView>,
}

impl GameView {
    pub fn from_session(game: &GameSession) -> Self {
        let finished = game.is_finished();
        let question = game.current_game_question().map(|q| QuestionView {
            level: q.level(),
            text: q.text().to_string(),
            variants: q
                .variants()
                .into_iter()
                .map(|(key, text)| (key, text.to_string()))
                .collect(),
            help: q.help().clone(),
            correct_key: finished.then(|| q.correct_answer_key()),
        });

        Self {
            id: game.id().clone(),
            user_id: game.user_id().clone(),
            status: game.status(),
            current_level: game.current_level(),
            prize: game.prize(),
            next_prize: (!finished).then(|| game.rules().prizes.prize_at(game.current_level())),
            created_at: game.created_at(),
            finished_at: game.finished_at(),
            used_help: game.used_help().iter().copied().collect(),
            question,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: User,
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub outcome: Outcome,
    pub game: GameView,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelpResponse {
    pub result: HelpResult,
    pub game: GameView,
}

// ========== Requests ==========

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGameRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub letter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelpRequest {
    pub help_type: HelpKind,
}

// ========== Handlers ==========

/// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> (StatusCode, Json<User>) {
    let user = state.register_user(req.name).await;
    (StatusCode::CREATED, Json(user))
}

/// GET /api/users/{id}
///
/// User record plus their game history, newest first
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .get_user(&id)
        .await
        .ok_or_else(|| GameError::UserNotFound(id.clone()))?;
    let games = state.games_for_user(&id).await;
    Ok(Json(UserProfile { user, games }))
}

/// POST /api/games
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameView>), ApiError> {
    let game = state.create_game_for_user(&req.user_id).await?;
    Ok((StatusCode::CREATED, Json(GameView::from_session(&game))))
}

/// GET /api/games/{id}
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<GameId>,
) -> Result<Json<GameView>, ApiError> {
    let game = state
        .get_game(&id)
        .await
        .ok_or_else(|| GameError::GameNotFound(id.clone()))?;
    Ok(Json(GameView::from_session(&game)))
}

/// POST /api/games/{id}/answer
pub async fn answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<GameId>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let key = AnswerKey::parse(&req.letter).ok_or_else(|| ApiError::BadRequest {
        code: "INVALID_LETTER",
        msg: format!("'{}' is not one of a, b, c, d", req.letter),
    })?;

    let update = state.answer(&id, key).await?;
    Ok(Json(MoveResponse {
        success: update.outcome.is_success(),
        outcome: update.outcome,
        game: GameView::from_session(&update.game),
    }))
}

/// POST /api/games/{id}/take_money
pub async fn take_money(
    State(state): State<Arc<AppState>>,
    Path(id): Path<GameId>,
) -> Result<Json<MoveResponse>, ApiError> {
    let update = state.take_money(&id).await?;
    Ok(Json(MoveResponse {
        success: update.outcome.is_success(),
        outcome: update.outcome,
        game: GameView::from_session(&update.game),
    }))
}

/// POST /api/games/{id}/help
pub async fn use_help(
    State(state): State<Arc<AppState>>,
    Path(id): Path<GameId>,
    Json(req): Json<HelpRequest>,
) -> Result<Json<HelpResponse>, ApiError> {
    let update = state.use_help(&id, req.help_type).await?;
    Ok(Json(HelpResponse {
        result: update.result,
        game: GameView::from_session(&update.game),
    }))
}

/// Export users and games as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<GameStateExport> {
    Json(state.export_state().await)
}

/// Import a snapshot, replacing all users and games.
///
/// POST /api/state/import
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(export): Json<GameStateExport>,
) -> Response {
    match state.import_state(export).await {
        Ok(()) => (StatusCode::OK, "State imported successfully").into_response(),
        Err(e) => {
            tracing::error!("State import failed: {}", e);
            ApiError::BadRequest {
                code: "INVALID_IMPORT",
                msg: format!("Import failed: {}", e),
            }
            .into_response()
        }
    }
}
