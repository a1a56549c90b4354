//! Player records and their matchmaking state.

use super::{MatchId, PlayerId, TableId};
use crate::gateway::BotIdentity;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Where a player stands inside its match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Waiting in the forming table
    Matching { table_id: TableId },
    /// Seated at an active table
    Playing { table_id: TableId, seat: usize },
    /// Between games; may continue or exit
    Resting,
}

impl PlayerState {
    pub fn table_id(&self) -> Option<TableId> {
        match self {
            PlayerState::Matching { table_id } | PlayerState::Playing { table_id, .. } => {
                Some(*table_id)
            }
            PlayerState::Resting => None,
        }
    }
}

/// Matchmaking extension of a player record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchProgress {
    state: PlayerState,
    since: Instant,
}

impl MatchProgress {
    fn new(state: PlayerState) -> Self {
        Self {
            state,
            since: Instant::now(),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// When the current state was entered
    pub fn since(&self) -> Instant {
        self.since
    }

    /// Time spent in the current state
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.since)
    }
}

/// A player owned by exactly one match
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    match_id: MatchId,
    /// Latest score reported by the game tier
    pub score: i64,
    /// Whether the player's client is connected
    pub online: bool,
    bot_expires_at: Option<DateTime<Utc>>,
    progress: MatchProgress,
}

impl Player {
    /// Create a human player entering the given forming table
    pub fn new(id: impl Into<PlayerId>, match_id: MatchId, score: i64, table_id: TableId) -> Self {
        Self {
            id: id.into(),
            match_id,
            score,
            online: true,
            bot_expires_at: None,
            progress: MatchProgress::new(PlayerState::Matching { table_id }),
        }
    }

    /// Create a bot player from an account-tier identity. Starts out resting until seated.
    pub fn bot(identity: BotIdentity, match_id: MatchId, score: i64) -> Self {
        Self {
            id: identity.id,
            match_id,
            score,
            online: true,
            bot_expires_at: Some(identity.expires_at),
            progress: MatchProgress::new(PlayerState::Resting),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn is_bot(&self) -> bool {
        self.bot_expires_at.is_some()
    }

    pub fn bot_expires_at(&self) -> Option<DateTime<Utc>> {
        self.bot_expires_at
    }

    /// A bot whose identity lease has run out. Always false for humans.
    pub fn bot_expired(&self, now: DateTime<Utc>) -> bool {
        self.bot_expires_at.is_some_and(|expires| expires <= now)
    }

    /// Only human players have a client to push to
    pub fn wants_push(&self) -> bool {
        !self.is_bot()
    }

    pub fn progress(&self) -> &MatchProgress {
        &self.progress
    }

    pub fn state(&self) -> PlayerState {
        self.progress.state
    }

    /// Table the player is assigned to, forming or active
    pub fn table_id(&self) -> Option<TableId> {
        self.progress.state.table_id()
    }

    pub fn is_resting(&self) -> bool {
        self.progress.state == PlayerState::Resting
    }

    /// Move to a new state and restart the state clock
    pub fn set_state(&mut self, state: PlayerState) {
        self.progress = MatchProgress::new(state);
    }

    /// Resting for longer than `timeout`
    pub fn rest_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.is_resting() && self.progress.elapsed(now) > timeout
    }
}
