//! Contracts for the external collaborators the matchmaking engine talks to.
//!
//! This module defines:
//! - MatchingRegistrar: cluster-wide "is this player matchmaking anywhere" guard
//! - GameGateway: request/push channel to the game-execution tier
//! - AccountGateway: bot identity provisioning
//! - ClientNotifier: pushes to a player's client (rest / exit acknowledgments)
//!
//! Transport and wire format are owned by the implementations. The engine only
//! relies on the put/remove and request/acknowledge semantics described here.
//!
//! ## Implementations
//!
//! - [`InMemoryRegistrar`]: single-process registrar
//! - [`PgMatchingRegistrar`]: PostgreSQL registrar shared by every instance
//!
//! The game, account and push tiers are implemented over HTTP by the server crate.

pub mod errors;
pub mod memory;
pub mod postgres;
pub mod timeouts;

pub use errors::{GatewayError, GatewayResult, RegistrarError, RegistrarResult};
pub use memory::InMemoryRegistrar;
pub use postgres::PgMatchingRegistrar;

use crate::matchmaking::{MatchId, PlayerId, TableId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Table creation parameters sent to the game tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub match_id: MatchId,
    pub table_id: TableId,
    pub game_type: String,
    /// Stake / score base of the table
    pub score_base: i64,
    /// Shuffle seed for the table's first round
    pub seed: u64,
}

/// Bot account handed out by the account tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: PlayerId,
    pub expires_at: DateTime<Utc>,
}

/// Pushes delivered to a player's client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientNotification {
    /// Game over; the client may continue or exit
    Rest { match_id: MatchId },
    /// Player has been removed from the match
    ExitMatch { match_id: MatchId },
}

/// Cluster-wide dedup guard. An entry means the player is matchmaking somewhere.
#[async_trait]
pub trait MatchingRegistrar: Send + Sync {
    /// Register the player; fails with `AlreadyExists` if an entry is present
    async fn put(&self, player_id: &str, match_id: MatchId) -> RegistrarResult<()>;

    /// Remove the player's entry. Removing an absent entry succeeds.
    async fn remove(&self, player_id: &str) -> RegistrarResult<()>;
}

/// Channel to the game-execution tier
#[async_trait]
pub trait GameGateway: Send + Sync {
    async fn create_table(&self, request: &CreateTableRequest) -> GatewayResult<()>;

    async fn add_player(
        &self,
        match_id: MatchId,
        table_id: TableId,
        player_id: &str,
        seat: usize,
    ) -> GatewayResult<()>;

    /// Tell the player's client to start the game client (push)
    async fn start_client(&self, match_id: MatchId, player_id: &str) -> GatewayResult<()>;

    /// Ask the game tier to release the player from its table.
    /// `Ok` is the positive acknowledgment.
    async fn request_exit(
        &self,
        match_id: MatchId,
        table_id: TableId,
        player_id: &str,
    ) -> GatewayResult<()>;

    /// Forward a connectivity change for a seated player (push)
    async fn push_net_state(
        &self,
        match_id: MatchId,
        table_id: TableId,
        player_id: &str,
        online: bool,
    ) -> GatewayResult<()>;
}

/// Bot provisioning
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn get_bot_identity(&self) -> GatewayResult<BotIdentity>;
}

/// Push channel to player clients
#[async_trait]
pub trait ClientNotifier: Send + Sync {
    async fn notify(&self, player_id: &str, notification: ClientNotification) -> GatewayResult<()>;
}

/// Every collaborator a match needs, injected at construction
#[derive(Clone)]
pub struct Gateways {
    pub registrar: Arc<dyn MatchingRegistrar>,
    pub game: Arc<dyn GameGateway>,
    pub accounts: Arc<dyn AccountGateway>,
    pub notifier: Arc<dyn ClientNotifier>,
}
