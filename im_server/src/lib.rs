//! Matchmaking server.
//!
//! Hosts the match domains of [`island_match`] behind an HTTP API, runs the
//! periodic sweep and talks to the game, account and push tiers over HTTP.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod remote;
