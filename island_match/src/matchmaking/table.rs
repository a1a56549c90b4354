//! Tables and the table id pool.

use super::{
    PlayerId, TableId,
    errors::{MatchError, MatchResult},
};
use std::{collections::BTreeSet, time::Duration};
use tokio::time::Instant;

/// Table lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePhase {
    /// Accepting signups
    Forming,
    /// Handed to the game tier
    Active,
    /// Game over received
    Closed,
}

/// A capacity-bounded group of players.
///
/// Players are kept in join order; that order is the seat order at dispatch.
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    capacity: usize,
    players: Vec<PlayerId>,
    phase: TablePhase,
    last_joined: Instant,
    /// Distinguishes reuses of the same id
    generation: u64,
}

impl Table {
    pub fn new(id: TableId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            players: Vec::with_capacity(capacity),
            phase: TablePhase::Forming,
            last_joined: Instant::now(),
            generation: 0,
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn phase(&self) -> TablePhase {
        self.phase
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    pub fn last_joined(&self) -> Instant {
        self.last_joined
    }

    /// Seat a player in a forming table
    ///
    /// # Returns
    ///
    /// * `MatchResult<bool>` - Whether this player filled the table
    pub fn add_player(&mut self, player_id: &str) -> MatchResult<bool> {
        if self.phase != TablePhase::Forming {
            return Err(MatchError::Inconsistent(format!(
                "table {} is {:?}, not forming",
                self.id, self.phase
            )));
        }

        if self.is_full() {
            return Err(MatchError::TableFull(self.id));
        }

        if self.contains(player_id) {
            return Err(MatchError::AlreadyMatching(player_id.to_string()));
        }

        self.players.push(player_id.to_string());
        self.last_joined = Instant::now();

        Ok(self.is_full())
    }

    /// Remove a player; returns whether it was seated here
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p != player_id);
        self.players.len() != before
    }

    /// Forming -> Active. Seats follow join order.
    ///
    /// # Returns
    ///
    /// * `MatchResult<Vec<(PlayerId, usize)>>` - Player and seat index pairs
    pub fn activate(&mut self) -> MatchResult<Vec<(PlayerId, usize)>> {
        if self.phase != TablePhase::Forming {
            return Err(MatchError::Inconsistent(format!(
                "table {} activated twice",
                self.id
            )));
        }

        self.phase = TablePhase::Active;
        Ok(self
            .players
            .iter()
            .enumerate()
            .map(|(seat, player_id)| (player_id.clone(), seat))
            .collect())
    }

    /// Active -> Closed
    pub fn close(&mut self) -> MatchResult<()> {
        if self.phase != TablePhase::Active {
            return Err(MatchError::Inconsistent(format!(
                "table {} closed while {:?}",
                self.id, self.phase
            )));
        }
        self.phase = TablePhase::Closed;
        Ok(())
    }

    /// Forming, below capacity, and nobody joined for longer than `threshold`
    pub fn backfill_due(&self, now: Instant, threshold: Duration) -> bool {
        self.phase == TablePhase::Forming
            && !self.is_full()
            && now.saturating_duration_since(self.last_joined) > threshold
    }
}

/// Free pool of table ids for one match.
///
/// Released ids are reused smallest-first before new ids are issued.
#[derive(Debug, Clone)]
pub struct TableIdPool {
    next: TableId,
    free: BTreeSet<TableId>,
}

impl Default for TableIdPool {
    fn default() -> Self {
        Self {
            next: 1,
            free: BTreeSet::new(),
        }
    }
}

impl TableIdPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease(&mut self) -> TableId {
        if let Some(id) = self.free.pop_first() {
            return id;
        }
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn release(&mut self, id: TableId) {
        if id < self.next {
            self.free.insert(id);
        } else {
            log::warn!("Ignoring release of table id {} that was never leased", id);
        }
    }

    /// Ids currently leased out
    pub fn leased(&self) -> usize {
        (self.next - 1) as usize - self.free.len()
    }
}
