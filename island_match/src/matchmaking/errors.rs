//! Matchmaking error types.

use super::{MatchId, PlayerId, TableId};
use crate::gateway::{GatewayError, RegistrarError};
use thiserror::Error;

/// Matchmaking errors
#[derive(Debug, Error)]
pub enum MatchError {
    /// Request carries no bound player identity
    #[error("Not logged in")]
    NotLoggedIn,

    /// Player is already matchmaking in this or another instance
    #[error("Player {0} is already matching")]
    AlreadyMatching(PlayerId),

    /// Continue requested by a player that is not resting
    #[error("Player {0} is not resting")]
    NotResting(PlayerId),

    /// Player unknown to this match
    #[error("Player {0} not found")]
    NotFound(PlayerId),

    /// Table id does not resolve to an active table
    #[error("Table {0} not found")]
    TableNotFound(TableId),

    /// Match id does not resolve to a loaded match
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    /// Table already holds its full capacity
    #[error("Table {0} is full")]
    TableFull(TableId),

    /// The game tier did not acknowledge the exit
    #[error("Exit of player {player_id} from table {table_id} was not confirmed")]
    ExitNotConfirmed { player_id: PlayerId, table_id: TableId },

    /// Registrar failure
    #[error("Registrar error: {0}")]
    Registrar(#[from] RegistrarError),

    /// Game, account or push tier failure
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Match configuration rejected at load time
    #[error("Invalid configuration for match {match_id}: {reason}")]
    InvalidConfig { match_id: MatchId, reason: String },

    /// Local state contradicts itself
    #[error("Inconsistent match state: {0}")]
    Inconsistent(String),
}

/// Coarse classification used for logging and response mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller mistake, surfaced to the client as-is
    Validation,
    /// Stale or malformed reference
    Lookup,
    /// A collaborator failed; the caller may retry
    External,
    /// Broken invariant or bad configuration
    Internal,
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::NotLoggedIn
            | MatchError::AlreadyMatching(_)
            | MatchError::NotResting(_)
            | MatchError::NotFound(_)
            | MatchError::TableFull(_) => ErrorKind::Validation,
            MatchError::TableNotFound(_) | MatchError::MatchNotFound(_) => ErrorKind::Lookup,
            MatchError::ExitNotConfirmed { .. }
            | MatchError::Registrar(_)
            | MatchError::Gateway(_) => ErrorKind::External,
            MatchError::InvalidConfig { .. } | MatchError::Inconsistent(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message
    ///
    /// Collaborator and internal failures are reduced to a generic message so
    /// infrastructure details never reach a player.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Lookup => self.to_string(),
            ErrorKind::External => match self {
                MatchError::ExitNotConfirmed { .. } => {
                    "Exit was not confirmed by the game server, please retry".to_string()
                }
                _ => "Matchmaking service temporarily unavailable".to_string(),
            },
            ErrorKind::Internal => "Internal server error".to_string(),
        }
    }
}

/// Result type for matchmaking operations
pub type MatchResult<T> = Result<T, MatchError>;
