//! Collaborator error types.

use crate::matchmaking::{MatchId, PlayerId};
use std::time::Duration;
use thiserror::Error;

/// Matching registrar errors
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// The player already holds an entry somewhere in the cluster
    #[error("Player {player_id} is already registered in match {match_id:?}")]
    AlreadyExists {
        player_id: PlayerId,
        match_id: Option<MatchId>,
    },

    /// Registrar did not answer in time
    #[error("Registrar timed out after {0:?}")]
    Timeout(Duration),

    /// Registrar storage error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Registrar unreachable for any other reason
    #[error("Registrar unavailable: {0}")]
    Unavailable(String),
}

/// Game tier, account tier and push channel errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote side answered but refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Remote call did not complete in time
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    /// Remote side unreachable
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// Malformed response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for registrar operations
pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
