//! Handing filled tables to the game tier and forwarding table events.

use super::{
    TableId,
    domain::{DispatchPlan, Match},
    errors::MatchResult,
};
use crate::gateway::{CreateTableRequest, GatewayResult};
use std::sync::Arc;

impl Match {
    /// Run dispatch for a freshly activated table in the background.
    ///
    /// The caller's request returns immediately. If the game tier rejects the
    /// table, its players are rested and the table id is released.
    pub(crate) fn spawn_dispatch(self: &Arc<Self>, plan: DispatchPlan) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.dispatch(&plan).await {
                log::error!(
                    "Match {}: dispatch of table {} failed: {}",
                    this.id(),
                    plan.table_id,
                    e
                );
                this.abort_dispatch(plan.table_id).await;
            }
        });
    }

    /// Create the table on the game tier, then add every seat in order and
    /// start each human's client.
    pub(crate) async fn dispatch(&self, plan: &DispatchPlan) -> GatewayResult<()> {
        let match_id = self.id();
        let game = &self.gateways().game;

        let request = CreateTableRequest {
            match_id,
            table_id: plan.table_id,
            game_type: self.config().game_type.clone(),
            score_base: self.config().score_base,
            seed: rand::random(),
        };
        game.create_table(&request).await?;

        for seat in &plan.seats {
            game.add_player(match_id, plan.table_id, &seat.player_id, seat.seat)
                .await?;

            if seat.is_bot {
                continue;
            }
            if let Err(e) = game.start_client(match_id, &seat.player_id).await {
                log::warn!(
                    "Match {}: start-client for {} at table {} failed: {}",
                    match_id,
                    seat.player_id,
                    plan.table_id,
                    e
                );
            }
        }

        log::info!(
            "Match {}: dispatched table {} with {} players",
            match_id,
            plan.table_id,
            plan.seats.len()
        );
        Ok(())
    }

    /// Undo an activation the game tier never accepted
    pub(crate) async fn abort_dispatch(&self, table_id: TableId) {
        let rested = match self.book.lock().await.close_table(table_id) {
            Ok(rested) => rested,
            Err(e) => {
                log::warn!(
                    "Match {}: table {} already gone during dispatch rollback: {}",
                    self.id(),
                    table_id,
                    e
                );
                return;
            }
        };

        log::info!(
            "Match {}: rolled back table {}, {} players resting",
            self.id(),
            table_id,
            rested.len()
        );
        self.push_rest(&rested).await;
    }

    /// Ask the game tier to release a seated player
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the game tier acknowledged the exit
    pub async fn exit_table(&self, table_id: TableId, player_id: &str) -> bool {
        match self
            .gateways()
            .game
            .request_exit(self.id(), table_id, player_id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Match {}: exit of {} from table {} not confirmed: {}",
                    self.id(),
                    player_id,
                    table_id,
                    e
                );
                false
            }
        }
    }

    /// Forward a seated player's connectivity to the game tier; a human
    /// coming back online also gets its client restarted.
    pub(crate) async fn net_change(
        &self,
        table_id: TableId,
        player_id: &str,
        online: bool,
        wants_push: bool,
    ) -> MatchResult<()> {
        let game = &self.gateways().game;
        game.push_net_state(self.id(), table_id, player_id, online)
            .await?;

        if online && wants_push {
            game.start_client(self.id(), player_id).await?;
        }

        log::debug!(
            "Match {}: {} at table {} is now {}",
            self.id(),
            player_id,
            table_id,
            if online { "online" } else { "offline" }
        );
        Ok(())
    }
}
