//! A single matchmaking domain and its player-facing operations.

use super::{
    MatchId, PlayerId, TableId,
    commit::confirm_then_apply,
    config::{MAX_EXPIRIES_PER_SWEEP, MatchConfig},
    errors::{MatchError, MatchResult},
    messages::{ExitMatchAck, HousekeepingReport, MatchSnapshot, PlayerScore, StartClientAck},
    player::{Player, PlayerState},
    table::{Table, TableIdPool},
};
use crate::gateway::{ClientNotification, GatewayResult, Gateways, RegistrarError};
use chrono::Utc;
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};
use tokio::{sync::Mutex, time::Instant};

/// Exit attempts before giving up on a player that keeps changing tables
const MAX_EXIT_ATTEMPTS: usize = 3;

/// One seat of a table being handed to the game tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeatAssignment {
    pub player_id: PlayerId,
    pub seat: usize,
    pub is_bot: bool,
}

/// Work produced when a forming table fills
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DispatchPlan {
    pub table_id: TableId,
    pub seats: Vec<SeatAssignment>,
}

/// Result of seating a player in the forming table
#[derive(Debug)]
pub(crate) struct Placement {
    pub table_id: TableId,
    pub dispatch: Option<DispatchPlan>,
}

/// Everything mutable about a match. Only touched under the match mutex.
///
/// `players` is the roster of every record the match owns; a player's
/// [`PlayerState`] says where it sits, and the forming table / active tables
/// list the same ids in seat order.
#[derive(Debug, Default)]
pub(crate) struct MatchBook {
    pub players: HashMap<PlayerId, Player>,
    pub forming: Option<Table>,
    pub active: HashMap<TableId, Table>,
    pub table_ids: TableIdPool,
    /// Forming tables opened so far; stamps each table's generation
    pub opened: u64,
    /// Players already evicted whose registrar entry still has to go
    pub pending_removals: BTreeSet<PlayerId>,
}

impl MatchBook {
    /// Id of the forming table, opening one if there is none
    pub fn open_forming(&mut self, capacity: usize) -> TableId {
        let MatchBook {
            forming,
            table_ids,
            opened,
            ..
        } = self;
        forming
            .get_or_insert_with(|| {
                *opened += 1;
                Table::new(table_ids.lease(), capacity).with_generation(*opened)
            })
            .id()
    }

    /// Whether the player still plays at this incarnation of an active table
    pub fn seated_at(&self, player_id: &str, table_id: TableId, generation: u64) -> bool {
        let playing_there = self.players.get(player_id).is_some_and(|p| {
            matches!(p.state(), PlayerState::Playing { table_id: t, .. } if t == table_id)
        });
        playing_there
            && self
                .active
                .get(&table_id)
                .is_some_and(|t| t.generation() == generation)
    }

    /// Put a rostered player into the forming table.
    ///
    /// When the player fills the table, the table is activated, every seated
    /// player becomes `Playing` and the table moves to the active set, all in
    /// this one call. On error nothing but the (possibly new) forming table
    /// has changed.
    pub fn seat(&mut self, player_id: &str, capacity: usize) -> MatchResult<Placement> {
        if !self.players.contains_key(player_id) {
            return Err(MatchError::Inconsistent(format!(
                "player {} seated without a record",
                player_id
            )));
        }

        let table_id = self.open_forming(capacity);
        let filled = match self.forming.as_mut() {
            Some(table) => table.add_player(player_id)?,
            None => return Err(MatchError::Inconsistent("forming table vanished".to_string())),
        };

        if let Some(player) = self.players.get_mut(player_id) {
            player.set_state(PlayerState::Matching { table_id });
        }

        let dispatch = if filled {
            Some(self.activate_forming()?)
        } else {
            None
        };

        Ok(Placement { table_id, dispatch })
    }

    fn activate_forming(&mut self) -> MatchResult<DispatchPlan> {
        let mut table = self
            .forming
            .take()
            .ok_or_else(|| MatchError::Inconsistent("no forming table to activate".to_string()))?;
        let table_id = table.id();

        let mut seats = Vec::with_capacity(table.len());
        for (player_id, seat) in table.activate()? {
            let player = self.players.get_mut(&player_id).ok_or_else(|| {
                MatchError::Inconsistent(format!("seated player {} has no record", player_id))
            })?;
            player.set_state(PlayerState::Playing { table_id, seat });
            seats.push(SeatAssignment {
                is_bot: player.is_bot(),
                player_id,
                seat,
            });
        }

        self.active.insert(table_id, table);
        Ok(DispatchPlan { table_id, seats })
    }

    /// Drop a player from its table (if any) and from the roster
    pub fn evict(&mut self, player_id: &str) -> Option<Player> {
        let player = self.players.remove(player_id)?;
        match player.state() {
            PlayerState::Matching { table_id } => {
                if let Some(table) = self.forming.as_mut().filter(|t| t.id() == table_id) {
                    table.remove_player(player_id);
                }
            }
            PlayerState::Playing { table_id, .. } => {
                if let Some(table) = self.active.get_mut(&table_id) {
                    table.remove_player(player_id);
                }
            }
            PlayerState::Resting => {}
        }
        Some(player)
    }

    /// Close an active table, move its players to resting and free its id.
    ///
    /// # Returns
    ///
    /// * `MatchResult<Vec<(PlayerId, bool)>>` - Rested players and whether each wants a push
    pub fn close_table(&mut self, table_id: TableId) -> MatchResult<Vec<(PlayerId, bool)>> {
        let mut table = self
            .active
            .remove(&table_id)
            .ok_or(MatchError::TableNotFound(table_id))?;
        table.close()?;

        let mut rested = Vec::with_capacity(table.len());
        for player_id in table.players() {
            match self.players.get_mut(player_id) {
                Some(player) => {
                    player.set_state(PlayerState::Resting);
                    rested.push((player_id.clone(), player.wants_push()));
                }
                None => log::error!(
                    "Table {} listed player {} without a record",
                    table_id,
                    player_id
                ),
            }
        }

        self.table_ids.release(table_id);
        Ok(rested)
    }

    /// Forming table that has stalled and holds at least one human
    pub fn backfill_candidate(&self, now: Instant, threshold: Duration) -> Option<TableId> {
        let table = self.forming.as_ref()?;
        let has_human = table
            .players()
            .iter()
            .any(|id| self.players.get(id).is_some_and(|p| !p.is_bot()));

        (has_human && table.backfill_due(now, threshold)).then(|| table.id())
    }

    /// Resting bot whose identity is still valid
    pub fn reusable_bot(&self, now: chrono::DateTime<Utc>) -> Option<PlayerId> {
        self.players
            .values()
            .filter(|p| p.is_bot() && p.is_resting() && !p.bot_expired(now))
            .map(|p| p.id())
            .min()
            .map(str::to_string)
    }
}

/// One matchmaking domain.
///
/// Lives for the whole process. Operations may be called concurrently from
/// request handlers and from the sweep.
pub struct Match {
    config: MatchConfig,
    gateways: Gateways,
    pub(crate) book: Mutex<MatchBook>,
}

impl Match {
    pub fn new(config: MatchConfig, gateways: Gateways) -> Self {
        Self {
            config,
            gateways,
            book: Mutex::new(MatchBook::default()),
        }
    }

    pub fn id(&self) -> MatchId {
        self.config.match_id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub(crate) fn gateways(&self) -> &Gateways {
        &self.gateways
    }

    /// Register a new player and seat it in the forming table
    ///
    /// # Arguments
    ///
    /// * `player_id` - Requester identity; empty means not logged in
    ///
    /// # Returns
    ///
    /// * `MatchResult<StartClientAck>` - Table placement; dispatch may still be in flight
    pub async fn signup(self: &Arc<Self>, player_id: &str) -> MatchResult<StartClientAck> {
        let player_id = require_player(player_id)?;

        {
            let mut book = self.book.lock().await;
            if book.players.contains_key(player_id) {
                return Err(MatchError::AlreadyMatching(player_id.to_string()));
            }
            if book.pending_removals.contains(player_id) {
                // Entry left over from an earlier exit
                self.gateways
                    .registrar
                    .remove(player_id)
                    .await
                    .map_err(|e| {
                        log::warn!(
                            "Match {}: stale registrar entry of {} still not removed: {}",
                            self.id(),
                            player_id,
                            e
                        );
                        MatchError::Registrar(e)
                    })?;
                book.pending_removals.remove(player_id);
            }
        }

        self.gateways
            .registrar
            .put(player_id, self.id())
            .await
            .map_err(|e| match e {
                RegistrarError::AlreadyExists { .. } => {
                    MatchError::AlreadyMatching(player_id.to_string())
                }
                other => {
                    log::error!(
                        "Match {}: registrar put failed for {}: {}",
                        self.id(),
                        player_id,
                        other
                    );
                    MatchError::Registrar(other)
                }
            })?;

        let placed = {
            let mut book = self.book.lock().await;
            let table_id = book.open_forming(self.config.capacity());
            book.players.insert(
                player_id.to_string(),
                Player::new(player_id, self.id(), self.config.initial_chips, table_id),
            );
            let placed = book.seat(player_id, self.config.capacity());
            if placed.is_err() {
                book.players.remove(player_id);
            }
            placed
        };

        match placed {
            Ok(placement) => {
                log::info!(
                    "Match {}: player {} joined table {}",
                    self.id(),
                    player_id,
                    placement.table_id
                );
                Ok(self.after_placement(player_id, placement))
            }
            Err(err) => {
                log::error!("Match {}: signup of {} failed: {}", self.id(), player_id, err);
                if let Err(e) = self.gateways.registrar.remove(player_id).await {
                    log::error!(
                        "Match {}: failed to roll back registrar entry of {}: {}",
                        self.id(),
                        player_id,
                        e
                    );
                }
                Err(err)
            }
        }
    }

    /// Move a resting player back into the forming table
    pub async fn continue_match(self: &Arc<Self>, player_id: &str) -> MatchResult<StartClientAck> {
        let player_id = require_player(player_id)?;

        let placement = {
            let mut book = self.book.lock().await;
            if !book.players.get(player_id).is_some_and(Player::is_resting) {
                return Err(MatchError::NotResting(player_id.to_string()));
            }
            book.seat(player_id, self.config.capacity())?
        };

        log::info!(
            "Match {}: player {} continued into table {}",
            self.id(),
            player_id,
            placement.table_id
        );
        Ok(self.after_placement(player_id, placement))
    }

    /// Remove a player from the match.
    ///
    /// A seated player is only removed once the game tier confirmed the exit.
    /// Matching and resting players are removed once the registrar dropped
    /// their entry.
    pub async fn exit_match(&self, player_id: &str) -> MatchResult<ExitMatchAck> {
        let player_id = require_player(player_id)?;
        let mut last_table = None;

        for attempt in 0..MAX_EXIT_ATTEMPTS {
            let mut guard = self.book.lock().await;

            let state = match guard.players.get(player_id).map(Player::state) {
                Some(state) => state,
                // Left while an earlier attempt waited on the game tier
                None if attempt > 0 => return Ok(self.exit_ack(player_id)),
                None => return Err(MatchError::NotFound(player_id.to_string())),
            };

            if let PlayerState::Playing { table_id, .. } = state {
                let generation = guard.active.get(&table_id).map(Table::generation).ok_or_else(
                    || {
                        MatchError::Inconsistent(format!(
                            "player {} playing at missing table {}",
                            player_id, table_id
                        ))
                    },
                )?;
                drop(guard);

                if self.exit_playing(player_id, table_id, generation).await? {
                    return Ok(self.exit_ack(player_id));
                }
                log::info!(
                    "Match {}: player {} moved on from table {} during exit, retrying",
                    self.id(),
                    player_id,
                    table_id
                );
                last_table = Some(table_id);
                continue;
            }

            let book = &mut *guard;
            confirm_then_apply(self.gateways.registrar.remove(player_id), move || async move {
                book.evict(player_id)
            })
            .await
            .map_err(|e| {
                log::error!(
                    "Match {}: registrar remove failed for {}: {}",
                    self.id(),
                    player_id,
                    e
                );
                MatchError::Registrar(e)
            })?;
            drop(guard);

            log::info!("Match {}: player {} left while {:?}", self.id(), player_id, state);
            return Ok(self.exit_ack(player_id));
        }

        Err(MatchError::ExitNotConfirmed {
            player_id: player_id.to_string(),
            table_id: last_table.unwrap_or_default(),
        })
    }

    /// Ask the game tier to release a seat, then evict the player if it still
    /// sits at the same table incarnation.
    ///
    /// # Returns
    ///
    /// * `MatchResult<bool>` - `false` if the player moved while the game tier answered
    async fn exit_playing(
        &self,
        player_id: &str,
        table_id: TableId,
        generation: u64,
    ) -> MatchResult<bool> {
        let confirm = async {
            if self.exit_table(table_id, player_id).await {
                Ok(())
            } else {
                Err(MatchError::ExitNotConfirmed {
                    player_id: player_id.to_string(),
                    table_id,
                })
            }
        };
        let left = confirm_then_apply(confirm, || async {
            let mut book = self.book.lock().await;
            if !book.seated_at(player_id, table_id, generation) {
                return false;
            }
            book.evict(player_id);

            if let Err(e) = self.gateways.registrar.remove(player_id).await {
                log::error!(
                    "Match {}: player {} left table {}, registrar removal deferred: {}",
                    self.id(),
                    player_id,
                    table_id,
                    e
                );
                book.pending_removals.insert(player_id.to_string());
            }
            true
        })
        .await?;

        if left {
            log::info!(
                "Match {}: player {} left active table {}",
                self.id(),
                player_id,
                table_id
            );
        }
        Ok(left)
    }

    /// Connectivity change reported for a player
    pub async fn network_state_changed(&self, player_id: &str, online: bool) -> MatchResult<()> {
        let (state, wants_push) = {
            let mut book = self.book.lock().await;
            let player = book
                .players
                .get_mut(player_id)
                .ok_or_else(|| MatchError::NotFound(player_id.to_string()))?;
            player.online = online;
            let state = player.state();
            let wants_push = player.wants_push();

            if let PlayerState::Playing { table_id, .. } = state
                && !book.active.contains_key(&table_id)
            {
                log::error!(
                    "Match {}: player {} is playing at table {} which is not active",
                    self.id(),
                    player_id,
                    table_id
                );
                return Err(MatchError::Inconsistent(format!(
                    "player {} playing at missing table {}",
                    player_id, table_id
                )));
            }
            (state, wants_push)
        };

        match state {
            PlayerState::Playing { table_id, .. } => {
                self.net_change(table_id, player_id, online, wants_push).await
            }
            PlayerState::Resting if wants_push => {
                self.notify(player_id, ClientNotification::Rest { match_id: self.id() })
                    .await?;
                Ok(())
            }
            PlayerState::Resting | PlayerState::Matching { .. } => Ok(()),
        }
    }

    /// Apply per-player scores reported by the game tier
    ///
    /// # Returns
    ///
    /// * `MatchResult<usize>` - Number of records updated
    pub async fn game_result(&self, table_id: TableId, scores: &[PlayerScore]) -> MatchResult<usize> {
        let mut book = self.book.lock().await;
        let MatchBook {
            players, active, ..
        } = &mut *book;

        let table = active.get(&table_id).ok_or_else(|| {
            log::warn!("Match {}: game result for unknown table {}", self.id(), table_id);
            MatchError::TableNotFound(table_id)
        })?;

        let mut updated = 0;
        for entry in scores {
            if !table.contains(&entry.player_id) {
                log::debug!(
                    "Match {}: ignoring score of {} not seated at table {}",
                    self.id(),
                    entry.player_id,
                    table_id
                );
                continue;
            }
            if let Some(player) = players.get_mut(&entry.player_id) {
                player.score = entry.score;
                updated += 1;
            }
        }

        Ok(updated)
    }

    /// Close a finished table; its players start resting
    pub async fn game_over(&self, table_id: TableId) -> MatchResult<()> {
        let rested = self.book.lock().await.close_table(table_id).map_err(|e| {
            log::warn!("Match {}: game over for table {}: {}", self.id(), table_id, e);
            e
        })?;

        log::info!(
            "Match {}: table {} closed, {} players resting",
            self.id(),
            table_id,
            rested.len()
        );
        self.push_rest(&rested).await;
        Ok(())
    }

    /// Periodic maintenance: retry deferred registrar removals, expire
    /// resting players, then backfill.
    ///
    /// Every step runs even if an earlier one failed; failures land in the
    /// report.
    pub async fn housekeep(self: &Arc<Self>) -> HousekeepingReport {
        let mut report = HousekeepingReport::default();
        self.expire_resting(&mut report).await;

        match self.backfill().await {
            Ok(Some((bot_id, reused))) => {
                report.backfilled = Some(bot_id);
                report.bot_reused = reused;
            }
            Ok(None) => {}
            Err(e) => report.backfill_error = Some(e),
        }
        report
    }

    /// Drop deferred registrar entries, then remove resting players past the
    /// rest timeout and resting bots whose identity expired.
    ///
    /// Registrar removal comes first; a player whose entry could not be
    /// removed stays for the next sweep. At most [`MAX_EXPIRIES_PER_SWEEP`]
    /// registrar calls are made per pass.
    async fn expire_resting(&self, report: &mut HousekeepingReport) {
        let now = Instant::now();
        let wall = Utc::now();
        let timeout = self.config.rest_timeout();
        let mut budget = MAX_EXPIRIES_PER_SWEEP;
        let mut notify = Vec::new();

        let mut guard = self.book.lock().await;

        let pending: Vec<PlayerId> = guard.pending_removals.iter().take(budget).cloned().collect();
        budget -= pending.len();
        for player_id in pending {
            match self.gateways.registrar.remove(&player_id).await {
                Ok(()) => {
                    guard.pending_removals.remove(&player_id);
                    report.released.push(player_id);
                }
                Err(e) => {
                    log::warn!(
                        "Match {}: deferred registrar removal of {} failed again: {}",
                        self.id(),
                        player_id,
                        e
                    );
                    report.expiry_error.get_or_insert(MatchError::Registrar(e));
                }
            }
        }

        let mut due: Vec<PlayerId> = guard
            .players
            .values()
            .filter(|p| p.rest_expired(now, timeout) || (p.is_resting() && p.bot_expired(wall)))
            .map(|p| p.id().to_string())
            .collect();
        due.sort();
        if due.len() > budget {
            log::debug!(
                "Match {}: {} resting players due, expiring {} this pass",
                self.id(),
                due.len(),
                budget
            );
            due.truncate(budget);
        }

        for player_id in due {
            let book = &mut *guard;
            let id = player_id.as_str();
            let removed = confirm_then_apply(self.gateways.registrar.remove(id), move || async move {
                book.evict(id)
            })
            .await;

            match removed {
                Ok(Some(player)) => {
                    if player.wants_push() {
                        notify.push(player_id.clone());
                    }
                    report.expired.push(player_id);
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!(
                        "Match {}: could not expire {}, registrar remove failed: {}",
                        self.id(),
                        player_id,
                        e
                    );
                    report.expiry_error.get_or_insert(MatchError::Registrar(e));
                }
            }
        }
        drop(guard);

        for player_id in &notify {
            if let Err(e) = self
                .notify(player_id, ClientNotification::ExitMatch { match_id: self.id() })
                .await
            {
                log::warn!("Match {}: exit push to {} failed: {}", self.id(), player_id, e);
            }
        }

        if !report.expired.is_empty() {
            log::info!(
                "Match {}: expired {} resting players",
                self.id(),
                report.expired.len()
            );
        }
    }

    /// Status counters
    pub async fn snapshot(&self) -> MatchSnapshot {
        let book = self.book.lock().await;
        let mut playing_players = 0;
        let mut resting_players = 0;
        let mut bots = 0;
        for player in book.players.values() {
            match player.state() {
                PlayerState::Playing { .. } => playing_players += 1,
                PlayerState::Resting => resting_players += 1,
                PlayerState::Matching { .. } => {}
            }
            if player.is_bot() {
                bots += 1;
            }
        }

        MatchSnapshot {
            match_id: self.id(),
            name: self.config.name.clone(),
            capacity: self.config.capacity(),
            forming_table: book.forming.as_ref().map(Table::id),
            forming_players: book.forming.as_ref().map_or(0, Table::len),
            active_tables: book.active.len(),
            playing_players,
            resting_players,
            bots,
        }
    }

    /// Copy of a player's record
    pub async fn player(&self, player_id: &str) -> Option<Player> {
        self.book.lock().await.players.get(player_id).cloned()
    }

    pub async fn player_state(&self, player_id: &str) -> Option<PlayerState> {
        self.book
            .lock()
            .await
            .players
            .get(player_id)
            .map(Player::state)
    }

    /// Copy of the forming table
    pub async fn forming_table(&self) -> Option<Table> {
        self.book.lock().await.forming.clone()
    }

    /// Copy of an active table
    pub async fn active_table(&self, table_id: TableId) -> Option<Table> {
        self.book.lock().await.active.get(&table_id).cloned()
    }

    /// Spawn dispatch if the placement filled a table, and build the ack
    pub(crate) fn after_placement(
        self: &Arc<Self>,
        player_id: &str,
        placement: Placement,
    ) -> StartClientAck {
        let dispatched = placement.dispatch.is_some();
        if let Some(plan) = placement.dispatch {
            self.spawn_dispatch(plan);
        }

        StartClientAck {
            match_id: self.id(),
            player_id: player_id.to_string(),
            table_id: placement.table_id,
            dispatched,
        }
    }

    pub(crate) async fn notify(
        &self,
        player_id: &str,
        notification: ClientNotification,
    ) -> GatewayResult<()> {
        self.gateways.notifier.notify(player_id, notification).await
    }

    /// Send rest acknowledgments to freshly rested humans
    pub(crate) async fn push_rest(&self, rested: &[(PlayerId, bool)]) {
        for (player_id, wants_push) in rested {
            if !wants_push {
                continue;
            }
            if let Err(e) = self
                .notify(player_id, ClientNotification::Rest { match_id: self.id() })
                .await
            {
                log::warn!("Match {}: rest push to {} failed: {}", self.id(), player_id, e);
            }
        }
    }

    fn exit_ack(&self, player_id: &str) -> ExitMatchAck {
        ExitMatchAck {
            match_id: self.id(),
            player_id: player_id.to_string(),
        }
    }
}

fn require_player(player_id: &str) -> MatchResult<&str> {
    if player_id.trim().is_empty() {
        return Err(MatchError::NotLoggedIn);
    }
    Ok(player_id)
}
