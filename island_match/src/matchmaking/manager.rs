//! Match registry and the periodic sweep over every match.

use super::{
    MatchId, PlayerId,
    config::MatchConfig,
    domain::Match,
    errors::{MatchError, MatchResult},
};
use crate::gateway::Gateways;
use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

/// Outcome of one sweep across all matches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Resting players removed, per match
    pub expired: Vec<(MatchId, PlayerId)>,
    /// Deferred registrar entries removed, per match
    pub released: Vec<(MatchId, PlayerId)>,
    /// Bots seated into forming tables, per match
    pub backfilled: Vec<(MatchId, PlayerId)>,
    /// Matches whose housekeeping failed this cycle
    pub failed: Vec<MatchId>,
}

/// Registry of every configured match domain.
///
/// Populated once at construction; the set of matches never changes afterwards.
pub struct MatchManager {
    matches: BTreeMap<MatchId, Arc<Match>>,
}

impl MatchManager {
    /// Build the registry
    ///
    /// Invalid configs and duplicate match ids are logged and skipped; the first
    /// config for an id wins.
    ///
    /// # Arguments
    ///
    /// * `configs` - One config per match domain
    /// * `gateways` - Collaborators shared by every match
    ///
    /// # Returns
    ///
    /// * `MatchManager` - Registry holding every valid domain
    pub fn new(configs: Vec<MatchConfig>, gateways: Gateways) -> Self {
        let mut matches = BTreeMap::new();

        for config in configs {
            if let Err(reason) = config.validate() {
                let err = MatchError::InvalidConfig {
                    match_id: config.match_id,
                    reason,
                };
                log::error!("Skipping match: {}", err);
                continue;
            }

            if matches.contains_key(&config.match_id) {
                log::warn!(
                    "Skipping duplicate config for match {} ({})",
                    config.match_id,
                    config.name
                );
                continue;
            }

            log::info!(
                "Loaded match {} '{}': {} players per table, game {}, bots {}",
                config.match_id,
                config.name,
                config.player_per_table,
                config.game_type,
                if config.bots_enabled { "on" } else { "off" }
            );
            matches.insert(
                config.match_id,
                Arc::new(Match::new(config, gateways.clone())),
            );
        }

        Self { matches }
    }

    /// Look up a match by id
    pub fn get(&self, match_id: MatchId) -> MatchResult<Arc<Match>> {
        self.matches.get(&match_id).cloned().ok_or_else(|| {
            log::warn!("Request for unknown match {}", match_id);
            MatchError::MatchNotFound(match_id)
        })
    }

    /// All matches, ordered by id
    pub fn matches(&self) -> impl Iterator<Item = &Arc<Match>> {
        self.matches.values()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Run housekeeping on every match.
    ///
    /// Each match is independent: a failure is logged and recorded, and the
    /// sweep moves on to the next match. A match that hit an error still
    /// contributes whatever it managed to do.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for (match_id, m) in &self.matches {
            let outcome = m.housekeep().await;

            for err in [&outcome.expiry_error, &outcome.backfill_error].into_iter().flatten() {
                log::error!("Sweep of match {} failed: {}", match_id, err);
            }
            if !outcome.is_clean() {
                report.failed.push(*match_id);
            }

            report
                .expired
                .extend(outcome.expired.into_iter().map(|p| (*match_id, p)));
            report
                .released
                .extend(outcome.released.into_iter().map(|p| (*match_id, p)));
            if let Some(bot_id) = outcome.backfilled {
                report.backfilled.push((*match_id, bot_id));
            }
        }

        log::debug!(
            "Sweep done: {} expired, {} backfilled, {} failed",
            report.expired.len(),
            report.backfilled.len(),
            report.failed.len()
        );
        report
    }

    /// Sweep every `period` on a background task. The first sweep runs one full
    /// period after the call.
    ///
    /// `on_report` is awaited with each sweep's report, e.g. to update metrics.
    pub fn spawn_sweeper<F, Fut>(self: Arc<Self>, period: Duration, mut on_report: F) -> JoinHandle<()>
    where
        F: FnMut(Arc<Self>, SweepReport) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            log::info!(
                "Sweeper started for {} matches, every {:?}",
                self.len(),
                period
            );

            loop {
                interval.tick().await;
                let report = self.sweep().await;
                on_report(Arc::clone(&self), report).await;
            }
        })
    }
}
