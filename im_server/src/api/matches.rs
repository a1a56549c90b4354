//! Player-facing match endpoints.

use super::AppState;
use crate::metrics;
use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use island_match::{
    ErrorKind, ExitMatchAck, MatchError, MatchId, MatchResult, MatchSnapshot, StartClientAck,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Header carrying the player identity bound to the caller's session
pub const USER_ID_HEADER: &str = "x-user-id";

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Matchmaking error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub MatchError);

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match (&self.0, self.0.kind()) {
            (MatchError::NotLoggedIn, _) => StatusCode::UNAUTHORIZED,
            (MatchError::AlreadyMatching(_), _) => StatusCode::CONFLICT,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::Lookup) => StatusCode::NOT_FOUND,
            (_, ErrorKind::External) => StatusCode::BAD_GATEWAY,
            (_, ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.0.client_message(),
            }),
        )
            .into_response()
    }
}

/// Player identity taken from [`USER_ID_HEADER`].
///
/// A missing or unreadable header yields an empty id, which the match rejects
/// as not logged in.
#[derive(Debug, Clone)]
pub struct PlayerIdentity(pub String);

impl<S> FromRequestParts<S> for PlayerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(PlayerIdentity(id))
    }
}

fn outcome_label(result: &Result<impl Sized, MatchError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => match e.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::Lookup => "lookup",
            ErrorKind::External => "external",
            ErrorKind::Internal => "internal",
        },
    }
}

/// Count the outcome and convert it into a handler result.
pub(super) fn respond<T>(operation: &'static str, result: MatchResult<T>) -> Result<Json<T>, ApiError> {
    metrics::requests_total(operation, outcome_label(&result));
    match result {
        Ok(value) => Ok(Json(value)),
        Err(e) => {
            if matches!(e.kind(), ErrorKind::External | ErrorKind::Internal) {
                tracing::warn!(operation, error = %e, "Request failed");
            }
            Err(ApiError(e))
        }
    }
}

/// List a status snapshot of every loaded match.
pub async fn list_matches(State(state): State<AppState>) -> Json<Vec<MatchSnapshot>> {
    let mut snapshots = Vec::with_capacity(state.manager.len());
    for m in state.manager.matches() {
        snapshots.push(m.snapshot().await);
    }
    Json(snapshots)
}

/// Sign the caller up for a match.
pub async fn signup(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<StartClientAck>, ApiError> {
    let result = match state.manager.get(match_id) {
        Ok(m) => m.signup(&player_id).await,
        Err(e) => Err(e),
    };
    respond("signup", result)
}

/// Re-queue a resting caller.
pub async fn continue_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<StartClientAck>, ApiError> {
    let result = match state.manager.get(match_id) {
        Ok(m) => m.continue_match(&player_id).await,
        Err(e) => Err(e),
    };
    respond("continue", result)
}

/// Leave the match.
pub async fn exit_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<ExitMatchAck>, ApiError> {
    let result = match state.manager.get(match_id) {
        Ok(m) => m.exit_match(&player_id).await,
        Err(e) => Err(e),
    };
    respond("exit", result)
}
