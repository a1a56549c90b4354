//! Prometheus metrics for the matchmaking server.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener when
//! `METRICS_BIND` is set. Without an installed exporter every call here is a no-op.
//!
//! # Metrics Categories
//!
//! - **Request Metrics**: operation outcomes
//! - **Sweep Metrics**: sweeps run, players expired, bots backfilled
//! - **Match Metrics**: per-match table and player gauges
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use im_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::requests_total("signup", "ok");
//! ```

use island_match::{MatchManager, MatchSnapshot, SweepReport};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Request Metrics
// ============================================================================

/// Count one handled operation by outcome (`ok` or an error kind).
pub fn requests_total(operation: &'static str, outcome: &'static str) {
    metrics::counter!("matchmaking_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// Sweep Metrics
// ============================================================================

/// Record the outcome of one sweep.
pub fn record_sweep(report: &SweepReport) {
    metrics::counter!("matchmaking_sweeps_total").increment(1);
    metrics::counter!("matchmaking_players_expired_total").increment(report.expired.len() as u64);
    metrics::counter!("matchmaking_deferred_removals_total")
        .increment(report.released.len() as u64);
    metrics::counter!("matchmaking_bots_backfilled_total")
        .increment(report.backfilled.len() as u64);
    metrics::counter!("matchmaking_sweep_failures_total").increment(report.failed.len() as u64);
}

// ============================================================================
// Match Metrics
// ============================================================================

/// Publish gauges for one match.
pub fn match_gauges(snapshot: &MatchSnapshot) {
    let match_id = snapshot.match_id.to_string();
    metrics::gauge!("matchmaking_active_tables", "match_id" => match_id.clone())
        .set(snapshot.active_tables as f64);
    metrics::gauge!("matchmaking_forming_players", "match_id" => match_id.clone())
        .set(snapshot.forming_players as f64);
    metrics::gauge!("matchmaking_resting_players", "match_id" => match_id)
        .set(snapshot.resting_players as f64);
}

/// Refresh the gauges of every match.
pub async fn refresh_match_gauges(manager: &MatchManager) {
    for m in manager.matches() {
        match_gauges(&m.snapshot().await);
    }
}
