//! Matchmaking and table assignment.
//!
//! This module implements:
//! - Player: per-player matchmaking record with a typed state extension
//! - Table: capacity-bounded group of players, forming or active
//! - Match: one matchmaking domain with its forming table, active tables and
//!   resting players
//! - MatchManager: registry of all configured domains and the periodic sweep
//!
//! ## Player lifecycle
//!
//! ```text
//! Matching --dispatch--> Playing --game over--> Resting --continue--> Matching
//! Resting --timeout | exit--> removed
//! Matching | Playing --exit (confirmed)--> removed
//! ```
//!
//! ## Concurrency
//!
//! Request handlers and the sweep call into the same `Match`. All of a match's
//! mutable collections sit behind one async mutex; the step that fills a forming
//! table, activates it and replaces it is a single critical section, so dispatch
//! fires exactly once per table. Dispatch itself runs on a spawned task.
//!
//! ## Example
//!
//! ```ignore
//! use island_match::matchmaking::{MatchConfig, MatchManager};
//!
//! let manager = MatchManager::new(vec![MatchConfig::default()], gateways);
//! let m = manager.get(1)?;
//! let ack = m.signup("player-1").await?;
//! ```

pub mod backfill;
pub mod commit;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod player;
pub mod table;

pub use config::{MAX_EXPIRIES_PER_SWEEP, MatchConfig};
pub use domain::Match;
pub use errors::{ErrorKind, MatchError, MatchResult};
pub use manager::{MatchManager, SweepReport};
pub use messages::{ExitMatchAck, HousekeepingReport, MatchSnapshot, PlayerScore, StartClientAck};
pub use player::{MatchProgress, Player, PlayerState};
pub use table::{Table, TableIdPool, TablePhase};

/// Match domain identifier
pub type MatchId = i32;

/// Table identifier, unique within one match
pub type TableId = i32;

/// Opaque player identity
pub type PlayerId = String;
