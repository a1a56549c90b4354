//! Bot backfill for forming tables that stopped filling up.
//!
//! A forming table that holds at least one human and has seen no join for
//! longer than the match's idle threshold gets one bot per sweep. Resting bots
//! are reused before a new identity is requested from the account tier.

use super::{
    PlayerId,
    domain::Match,
    errors::{MatchError, MatchResult},
    player::Player,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;

impl Match {
    /// Seat at most one bot in a stalled forming table.
    ///
    /// # Returns
    ///
    /// * `MatchResult<Option<(PlayerId, bool)>>` - Seated bot and whether it was reused
    pub(crate) async fn backfill(self: &Arc<Self>) -> MatchResult<Option<(PlayerId, bool)>> {
        if !self.config().bots_enabled {
            return Ok(None);
        }

        let capacity = self.config().capacity();
        let threshold = self.config().idle_threshold();

        let table_id = {
            let mut book = self.book.lock().await;
            let Some(table_id) = book.backfill_candidate(Instant::now(), threshold) else {
                return Ok(None);
            };

            if let Some(bot_id) = book.reusable_bot(Utc::now()) {
                let placement = book.seat(&bot_id, capacity)?;
                drop(book);

                log::info!(
                    "Match {}: reused bot {} for table {}",
                    self.id(),
                    bot_id,
                    table_id
                );
                self.after_placement(&bot_id, placement);
                return Ok(Some((bot_id, true)));
            }
            table_id
        };

        let identity = self.gateways().accounts.get_bot_identity().await.map_err(|e| {
            log::warn!("Match {}: no bot identity available: {}", self.id(), e);
            MatchError::Gateway(e)
        })?;

        self.gateways()
            .registrar
            .put(&identity.id, self.id())
            .await
            .map_err(|e| {
                log::warn!(
                    "Match {}: bot {} could not be registered: {}",
                    self.id(),
                    identity.id,
                    e
                );
                MatchError::Registrar(e)
            })?;

        let bot = Player::bot(identity, self.id(), self.config().initial_chips);
        let bot_id = bot.id().to_string();

        let placement = {
            let mut book = self.book.lock().await;
            if book.players.contains_key(&bot_id) {
                return Err(MatchError::Inconsistent(format!(
                    "bot {} registered while already rostered",
                    bot_id
                )));
            }
            book.players.insert(bot_id.clone(), bot);

            // The table may have filled or gone while the account tier answered
            if book.backfill_candidate(Instant::now(), threshold) != Some(table_id) {
                log::info!(
                    "Match {}: table {} no longer needs a bot, {} parked as resting",
                    self.id(),
                    table_id,
                    bot_id
                );
                return Ok(None);
            }
            book.seat(&bot_id, capacity)?
        };

        log::info!(
            "Match {}: bot {} backfilled into table {}",
            self.id(),
            bot_id,
            table_id
        );
        self.after_placement(&bot_id, placement);
        Ok(Some((bot_id, false)))
    }
}
