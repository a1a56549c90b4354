//! Game-tier callbacks: connectivity changes, results and game over.

use super::{AppState, matches::{ApiError, respond}};
use axum::{
    Json,
    extract::{Path, State},
};
use island_match::{MatchId, PlayerId, PlayerScore, TableId};
use serde::{Deserialize, Serialize};

/// Connectivity change of one player
#[derive(Debug, Deserialize)]
pub struct NetStateRequest {
    pub player_id: PlayerId,
    pub online: bool,
}

/// Final scores of a game
#[derive(Debug, Deserialize)]
pub struct GameResultRequest {
    pub players: Vec<PlayerScore>,
}

/// Number of seated players whose score was recorded
#[derive(Debug, Serialize, Deserialize)]
pub struct GameResultResponse {
    pub updated: usize,
}

/// Generic acknowledgment
#[derive(Debug, Serialize, Deserialize)]
pub struct Accepted {
    pub accepted: bool,
}

pub async fn net_state(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(request): Json<NetStateRequest>,
) -> Result<Json<Accepted>, ApiError> {
    let result = match state.manager.get(match_id) {
        Ok(m) => m
            .network_state_changed(&request.player_id, request.online)
            .await
            .map(|_| Accepted { accepted: true }),
        Err(e) => Err(e),
    };
    respond("net_state", result)
}

pub async fn game_result(
    State(state): State<AppState>,
    Path((match_id, table_id)): Path<(MatchId, TableId)>,
    Json(request): Json<GameResultRequest>,
) -> Result<Json<GameResultResponse>, ApiError> {
    let result = match state.manager.get(match_id) {
        Ok(m) => m
            .game_result(table_id, &request.players)
            .await
            .map(|updated| GameResultResponse { updated }),
        Err(e) => Err(e),
    };
    respond("game_result", result)
}

pub async fn game_over(
    State(state): State<AppState>,
    Path((match_id, table_id)): Path<(MatchId, TableId)>,
) -> Result<Json<Accepted>, ApiError> {
    let result = match state.manager.get(match_id) {
        Ok(m) => m.game_over(table_id).await.map(|_| Accepted { accepted: true }),
        Err(e) => Err(e),
    };
    respond("game_over", result)
}
