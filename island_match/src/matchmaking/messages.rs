//! Request acknowledgments and status types returned by a match.

use super::{MatchId, PlayerId, TableId, errors::MatchError};
use serde::{Deserialize, Serialize};

/// Acknowledgment of a signup or continue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartClientAck {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    /// Table the player was placed in
    pub table_id: TableId,
    /// Whether this player filled the table and triggered dispatch
    pub dispatched: bool,
}

/// Acknowledgment of an exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitMatchAck {
    pub match_id: MatchId,
    pub player_id: PlayerId,
}

/// Score of one player in a game result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub score: i64,
}

/// Point-in-time view of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub name: String,
    pub capacity: usize,
    pub forming_table: Option<TableId>,
    pub forming_players: usize,
    pub active_tables: usize,
    pub playing_players: usize,
    pub resting_players: usize,
    pub bots: usize,
}

/// Outcome of one housekeeping pass over a match
#[derive(Debug, Default)]
pub struct HousekeepingReport {
    /// Resting players removed (rest timeout or expired bot)
    pub expired: Vec<PlayerId>,
    /// Players whose deferred registrar entry was finally removed
    pub released: Vec<PlayerId>,
    /// Bot seated into the forming table, if any
    pub backfilled: Option<PlayerId>,
    /// Whether the backfilled bot came from the resting pool
    pub bot_reused: bool,
    /// First registrar failure hit while expiring; the rest of the pass still ran
    pub expiry_error: Option<MatchError>,
    pub backfill_error: Option<MatchError>,
}

impl HousekeepingReport {
    pub fn is_clean(&self) -> bool {
        self.expiry_error.is_none() && self.backfill_error.is_none()
    }
}
