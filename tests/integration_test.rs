use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeDelta, Utc};
use millionaire::api::{self, ErrorBody, GameView, UserProfile};
use millionaire::bank::{generated_questions, InMemoryQuestionBank};
use millionaire::config::GameConfig;
use millionaire::phrasebook::Phrasebook;
use millionaire::prize::PrizeTable;
use millionaire::session::GameRules;
use millionaire::state::export::{LadderSlot, SessionRecord};
use millionaire::state::AppState;
use millionaire::types::{AnswerKey, GameStatus, HelpKind, User};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tower::ServiceExt;

fn rules_with_limit(minutes: i64) -> GameRules {
    GameRules {
        prizes: PrizeTable::default(),
        time_limit: TimeDelta::minutes(minutes),
    }
}

fn new_state() -> Arc<AppState> {
    let bank = InMemoryQuestionBank::new(generated_questions(14, 4)).unwrap();
    Arc::new(AppState::new(
        rules_with_limit(60),
        Arc::new(bank),
        Phrasebook::default(),
    ))
}

fn app(state: &Arc<AppState>) -> Router {
    let config = GameConfig {
        state_routes_enabled: true,
        ..GameConfig::default()
    };
    api::router(state.clone(), &config)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app(state), request).await
}

async fn post(state: &Arc<AppState>, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app(state), request).await
}

/// The right key for the current question, read straight from state
async fn right_key(state: &AppState, game_id: &str) -> AnswerKey {
    state
        .get_game(&game_id.to_string())
        .await
        .unwrap()
        .current_game_question()
        .unwrap()
        .correct_answer_key()
}

/// A stored game `minutes_ago` old that has cleared `cleared` levels
fn record_for(user: &User, cleared: usize, minutes_ago: i64) -> SessionRecord {
    let ladder = generated_questions(14, 1)
        .into_iter()
        .map(|question| LadderSlot {
            question,
            order: [0, 1, 2, 3],
        })
        .collect();
    SessionRecord {
        id: format!("game-{}", user.id),
        user_id: user.id.clone(),
        ladder,
        current_level: cleared,
        is_failed: false,
        created_at: Utc::now() - TimeDelta::minutes(minutes_ago),
        finished_at: None,
        prize: 0,
        help_usage: BTreeSet::new(),
        per_level_help_state: BTreeMap::new(),
    }
}

async fn import(state: &AppState, user: &User, record: SessionRecord) {
    let mut export = state.export_state().await;
    export.users.insert(user.id.clone(), user.clone());
    export.games.push(record);
    state.import_state(export).await.unwrap();
}

/// End-to-end: register, play two questions over HTTP, take the money
#[tokio::test]
async fn test_full_game_flow() {
    let state = new_state();

    let (status, user) = post(&state, "/api/users", json!({ "name": "serg" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let user: User = serde_json::from_value(user).unwrap();
    assert_eq!(user.name, "serg");

    let (status, game) = post(&state, "/api/games", json!({ "user_id": user.id })).await;
    assert_eq!(status, StatusCode::CREATED);
    let game: GameView = serde_json::from_value(game).unwrap();
    assert_eq!(game.status, GameStatus::InProgress);
    assert_eq!(game.current_level, 0);
    assert!(game.question.as_ref().unwrap().correct_key.is_none());

    for expected_level in 1..=2 {
        let key = right_key(&state, &game.id).await;
        let uri = format!("/api/games/{}/answer", game.id);
        let (status, body) = post(&state, &uri, json!({ "letter": key.upper() })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["game"]["current_level"], expected_level);
        assert_eq!(body["game"]["status"], "in_progress");
    }

    let uri = format!("/api/games/{}/take_money", game.id);
    let (status, body) = post(&state, &uri, Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], "money");
    assert_eq!(body["outcome"]["payout"], 200);
    assert_eq!(body["game"]["prize"], 200);

    let (status, profile) = get(&state, &format!("/api/users/{}", user.id)).await;
    assert_eq!(status, StatusCode::OK);
    let profile: UserProfile = serde_json::from_value(profile).unwrap();
    assert_eq!(profile.user.balance, 200);
    assert_eq!(profile.games.len(), 1);
    assert_eq!(profile.games[0].status, GameStatus::Money);
    assert_eq!(profile.games[0].current_level, 2);

    // the game is over for good
    let uri = format!("/api/games/{}/answer", game.id);
    let (status, body) = post(&state, &uri, json!({ "letter": "a" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: ErrorBody = serde_json::from_value(body).unwrap();
    assert_eq!(body.code, "INACTIVE_SESSION");
}

#[tokio::test]
async fn test_help_over_http() {
    let state = new_state();
    let user = state.register_user(None).await;
    let game = state.create_game_for_user(&user.id).await.unwrap();
    let uri = format!("/api/games/{}/help", game.id());

    let (status, body) = post(&state, &uri, json!({ "help_type": "audience_help" })).await;
    assert_eq!(status, StatusCode::OK);
    let distribution = body["result"]["audience"].as_object().unwrap();
    let mut keys: Vec<&str> = distribution.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["a", "b", "c", "d"]);
    let total: u64 = distribution.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, 100);
    assert_eq!(body["game"]["used_help"], json!(["audience_help"]));

    let (status, body) = post(&state, &uri, json!({ "help_type": "friend_call" })).await;
    assert_eq!(status, StatusCode::OK);
    let message = body["result"]["friend_call"].as_str().unwrap();
    assert!(message.contains("thinks the answer is"));
    assert!(message.ends_with(['A', 'B', 'C', 'D']));

    let (status, body) = post(&state, &uri, json!({ "help_type": "audience_help" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_USED_HELP");
}

#[tokio::test]
async fn test_bad_requests() {
    let state = new_state();
    let user = state.register_user(None).await;
    let game = state.create_game_for_user(&user.id).await.unwrap();

    let uri = format!("/api/games/{}/answer", game.id());
    let (status, body) = post(&state, &uri, json!({ "letter": "e" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_LETTER");

    let (status, _) = get(&state, "/api/games/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(&state, "/api/games", json!({ "user_id": user.id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "GAME_IN_PROGRESS");

    let (status, _) = post(&state, "/api/games", json!({ "user_id": "ghost" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_bank_is_unavailable() {
    let state = Arc::new(AppState::new(
        rules_with_limit(60),
        Arc::new(InMemoryQuestionBank::default()),
        Phrasebook::default(),
    ));
    let user = state.register_user(None).await;

    let (status, body) = post(&state, "/api/games", json!({ "user_id": user.id })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "INSUFFICIENT_QUESTIONS");
}

/// Last question answered right wins the million
#[tokio::test]
async fn test_final_question_wins() {
    let state = new_state();
    let user = state.register_user(None).await;
    import(&state, &user, record_for(&user, 14, 1)).await;
    let game_id = format!("game-{}", user.id);

    // generated questions keep the right answer first, order is identity
    let update = state.answer(&game_id, AnswerKey::A).await.unwrap();
    assert_eq!(update.outcome.status, GameStatus::Won);
    assert_eq!(update.game.prize(), 1_000_000);
    assert!(update.game.is_finished());
    assert_eq!(state.get_user(&user.id).await.unwrap().balance, 1_000_000);
}

/// Over the time limit every answer is a timeout, right or wrong
#[tokio::test]
async fn test_answer_after_time_limit() {
    for key in [AnswerKey::A, AnswerKey::B] {
        let state = new_state();
        let user = state.register_user(None).await;
        import(&state, &user, record_for(&user, 7, 61)).await;
        let game_id = format!("game-{}", user.id);

        let update = state.answer(&game_id, key).await.unwrap();
        assert!(!update.outcome.is_success());
        assert_eq!(update.outcome.status, GameStatus::Timeout);
        assert_eq!(update.game.status(), GameStatus::Timeout);
        // cleared levels 0..=6, floor is the level 4 checkpoint
        assert_eq!(update.game.prize(), 1_000);
        assert_eq!(state.get_user(&user.id).await.unwrap().balance, 1_000);
    }
}

/// Cashing out after ten cleared levels pays the level 9 prize once
#[tokio::test]
async fn test_cash_out_after_ten_levels() {
    let state = new_state();
    let user = state.register_user(None).await;
    import(&state, &user, record_for(&user, 10, 5)).await;
    let game_id = format!("game-{}", user.id);

    let update = state.take_money(&game_id).await.unwrap();
    assert_eq!(update.outcome.status, GameStatus::Money);
    assert_eq!(update.game.prize(), 32_000);
    assert_eq!(state.get_user(&user.id).await.unwrap().balance, 32_000);

    assert!(state.take_money(&game_id).await.is_err());
    assert!(state.answer(&game_id, AnswerKey::A).await.is_err());
    assert_eq!(state.get_user(&user.id).await.unwrap().balance, 32_000);
}

#[tokio::test]
async fn test_wrong_first_answer() {
    let state = new_state();
    let user = state.register_user(None).await;
    let game = state.create_game_for_user(&user.id).await.unwrap();
    let right = right_key(&state, game.id()).await;
    let wrong = AnswerKey::ALL.into_iter().find(|k| *k != right).unwrap();

    let update = state.answer(game.id(), wrong).await.unwrap();
    assert_eq!(update.outcome.status, GameStatus::Fail);
    assert_eq!(update.game.prize(), 0);
    assert!(update.game.finished_at().is_some());
    assert_eq!(state.get_user(&user.id).await.unwrap().balance, 0);
}

#[tokio::test]
async fn test_concurrent_take_money_pays_once() {
    let state = new_state();
    let user = state.register_user(None).await;
    import(&state, &user, record_for(&user, 5, 1)).await;
    let game_id = format!("game-{}", user.id);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            let game_id = game_id.clone();
            tokio::spawn(async move { state.take_money(&game_id).await.is_ok() })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(state.get_user(&user.id).await.unwrap().balance, 1_000);
}

#[tokio::test]
async fn test_export_endpoint_round_trip() {
    let state = new_state();
    let user = state.register_user(Some("alex".to_string())).await;
    let game = state.create_game_for_user(&user.id).await.unwrap();
    state
        .use_help(game.id(), HelpKind::FiftyFifty)
        .await
        .unwrap();

    let (status, export) = get(&state, "/api/state/export").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["games"][0]["help_usage"], json!(["fifty_fifty"]));

    let fresh = new_state();
    let (status, _) = post(&fresh, "/api/state/import", export).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fresh.get_user(&user.id).await.unwrap().name, "alex");
    assert!(fresh.get_game(game.id()).await.is_some());

    let newer = json!({
        "schema_version": 999,
        "exported_at": "now",
        "users": {},
        "games": []
    });
    let (status, body) = post(&fresh, "/api/state/import", newer).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_IMPORT");
}

#[tokio::test]
async fn test_state_routes_off_by_default() {
    let state = new_state();
    let user = state.register_user(None).await;
    state.create_game_for_user(&user.id).await.unwrap();
    let app = api::router(state.clone(), &GameConfig::default());

    let request = Request::get("/api/state/export").body(Body::empty()).unwrap();
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::post("/api/state/import")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "users": {}, "games": [] }).to_string()))
        .unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // nothing was wiped
    assert!(state.get_user(&user.id).await.is_some());
    assert_eq!(state.games_for_user(&user.id).await.len(), 1);
}
