//! # Island Match
//!
//! Matchmaking and table-assignment engine for multiplayer game backends.
//!
//! Players sign up into a match domain, are grouped into fixed-capacity tables,
//! and each filled table is handed to a separate game-execution tier. Results
//! and game-over notifications flow back in; players then rest, continue or
//! leave. A cluster-wide registrar guarantees that a player matchmakes in at
//! most one domain at a time.
//!
//! ## Core Modules
//!
//! - [`matchmaking`]: Player records, tables, the per-domain match state machine,
//!   bot backfill and the match registry with its periodic sweep
//! - [`gateway`]: Contracts for the registrar, game tier, account tier and client
//!   pushes, with in-memory and PostgreSQL registrars
//! - [`db`]: PostgreSQL pool configuration
//!
//! ## Example
//!
//! ```ignore
//! use island_match::{MatchConfig, MatchManager};
//!
//! let manager = MatchManager::new(vec![MatchConfig::default()], gateways);
//! let ack = manager.get(1)?.signup("player-1").await?;
//! println!("seated at table {}", ack.table_id);
//! ```

/// Database pool configuration.
pub mod db;

/// External collaborator contracts and registrar implementations.
pub mod gateway;
pub use gateway::{
    AccountGateway, BotIdentity, ClientNotification, ClientNotifier, CreateTableRequest, GameGateway,
    GatewayError, Gateways, InMemoryRegistrar, MatchingRegistrar, PgMatchingRegistrar,
    RegistrarError,
};

/// Matchmaking engine.
pub mod matchmaking;
pub use matchmaking::{
    ErrorKind, ExitMatchAck, HousekeepingReport, MAX_EXPIRIES_PER_SWEEP, Match, MatchConfig,
    MatchError, MatchId, MatchManager, MatchResult, MatchSnapshot, Player, PlayerId, PlayerScore,
    PlayerState, StartClientAck, SweepReport, TableId,
};
