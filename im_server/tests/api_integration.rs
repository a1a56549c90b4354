//! Integration tests for the HTTP API.
//!
//! The router runs against an in-memory registrar and collaborators that
//! accept every call, so no database or network is needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use im_server::api::{AppState, create_router};
use island_match::{
    AccountGateway, BotIdentity, ClientNotification, ClientNotifier, CreateTableRequest,
    GameGateway, GatewayError, Gateways, InMemoryRegistrar, MatchConfig, MatchId, MatchManager,
    TableId, gateway::GatewayResult,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Collaborator that accepts every call
struct Accepting;

#[async_trait]
impl GameGateway for Accepting {
    async fn create_table(&self, _request: &CreateTableRequest) -> GatewayResult<()> {
        Ok(())
    }

    async fn add_player(&self, _: MatchId, _: TableId, _: &str, _: usize) -> GatewayResult<()> {
        Ok(())
    }

    async fn start_client(&self, _: MatchId, _: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn request_exit(&self, _: MatchId, _: TableId, _: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn push_net_state(&self, _: MatchId, _: TableId, _: &str, _: bool) -> GatewayResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AccountGateway for Accepting {
    async fn get_bot_identity(&self) -> GatewayResult<BotIdentity> {
        Err(GatewayError::Unavailable("no bots here".to_string()))
    }
}

#[async_trait]
impl ClientNotifier for Accepting {
    async fn notify(&self, _: &str, _: ClientNotification) -> GatewayResult<()> {
        Ok(())
    }
}

fn create_app(configs: Vec<MatchConfig>) -> axum::Router {
    let accepting = Arc::new(Accepting);
    let gateways = Gateways {
        registrar: Arc::new(InMemoryRegistrar::new()),
        game: accepting.clone(),
        accounts: accepting.clone(),
        notifier: accepting,
    };
    let manager = Arc::new(MatchManager::new(configs, gateways));
    create_router(AppState { manager })
}

/// One match, two players per table
fn duel_app() -> axum::Router {
    create_app(vec![MatchConfig {
        match_id: 1,
        name: "Duel".to_string(),
        player_per_table: 2,
        ..MatchConfig::default()
    }])
}

fn post(uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = duel_app();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["matches"], 1);
}

#[tokio::test]
async fn test_health_degraded_without_matches() {
    let app = create_app(vec![]);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call(&app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = duel_app();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-7");
}

// ============================================================================
// Player Operation Tests
// ============================================================================

#[tokio::test]
async fn test_signup_without_identity_is_unauthorized() {
    let app = duel_app();

    let (status, body) = call(&app, post("/api/v1/matches/1/signup", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not logged in");
}

#[tokio::test]
async fn test_signup_unknown_match() {
    let app = duel_app();

    let (status, body) = call(&app, post("/api/v1/matches/9/signup", Some("alice"), None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Match 9 not found");
}

#[tokio::test]
async fn test_signup_and_duplicate() {
    let app = duel_app();

    let (status, body) = call(&app, post("/api/v1/matches/1/signup", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_id"], "alice");
    assert_eq!(body["table_id"], 1);
    assert_eq!(body["dispatched"], false);

    let (status, _) = call(&app, post("/api/v1/matches/1/signup", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_round_trip() {
    let app = duel_app();

    call(&app, post("/api/v1/matches/1/signup", Some("alice"), None)).await;
    let (_, body) = call(&app, post("/api/v1/matches/1/signup", Some("bob"), None)).await;
    assert_eq!(body["dispatched"], true);

    let (status, body) = call(
        &app,
        post(
            "/api/v1/matches/1/tables/1/result",
            None,
            Some(json!({ "players": [
                { "player_id": "alice", "score": 12 },
                { "player_id": "mallory", "score": 99 },
            ]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (status, _) = call(&app, post("/api/v1/matches/1/tables/1/over", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, post("/api/v1/matches/1/continue", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table_id"], 1);

    let (status, body) = call(&app, post("/api/v1/matches/1/exit", Some("bob"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_id"], "bob");

    let request = Request::builder()
        .uri("/api/v1/matches")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["match_id"], 1);
    assert_eq!(body[0]["forming_players"], 1);
    assert_eq!(body[0]["active_tables"], 0);
    assert_eq!(body[0]["resting_players"], 0);
}

#[tokio::test]
async fn test_continue_while_matching_is_rejected() {
    let app = duel_app();

    call(&app, post("/api/v1/matches/1/signup", Some("alice"), None)).await;
    let (status, body) = call(&app, post("/api/v1/matches/1/continue", Some("alice"), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Player alice is not resting");
}

// ============================================================================
// Game Tier Callback Tests
// ============================================================================

#[tokio::test]
async fn test_game_over_unknown_table() {
    let app = duel_app();

    let (status, _) = call(&app, post("/api/v1/matches/1/tables/5/over", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_net_state_routing() {
    let app = duel_app();
    call(&app, post("/api/v1/matches/1/signup", Some("alice"), None)).await;

    let (status, body) = call(
        &app,
        post(
            "/api/v1/matches/1/net-state",
            None,
            Some(json!({ "player_id": "alice", "online": false })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);

    let (status, _) = call(
        &app,
        post(
            "/api/v1/matches/1/net-state",
            None,
            Some(json!({ "player_id": "ghost", "online": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_result_body() {
    let app = duel_app();

    let response = app
        .oneshot(post(
            "/api/v1/matches/1/tables/1/result",
            None,
            Some(json!({ "scores": [] })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
