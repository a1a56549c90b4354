//! PostgreSQL-backed matching registrar shared by every instance of the service.

use super::{
    MatchingRegistrar, RegistrarError, RegistrarResult,
    timeouts::{DEFAULT_RPC_TIMEOUT, with_timeout},
};
use crate::matchmaking::MatchId;
use async_trait::async_trait;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};

/// Registrar storing one row per matchmaking player.
///
/// The primary key on `player_id` is what makes a second `put` fail, so the
/// guarantee holds across processes sharing the database.
#[derive(Clone)]
pub struct PgMatchingRegistrar {
    pool: Arc<PgPool>,
    timeout: Duration,
}

impl PgMatchingRegistrar {
    /// Create a registrar over an existing pool
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `timeout` - Deadline applied to every query
    pub fn new(pool: Arc<PgPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Create a registrar with [`DEFAULT_RPC_TIMEOUT`]
    pub fn with_default_timeout(pool: Arc<PgPool>) -> Self {
        Self::new(pool, DEFAULT_RPC_TIMEOUT)
    }

    /// Create the registrar table if it does not exist yet
    pub async fn ensure_schema(&self) -> RegistrarResult<()> {
        with_timeout(self.timeout, async {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS matching_players (
                    player_id     TEXT PRIMARY KEY,
                    match_id      INTEGER NOT NULL,
                    registered_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#,
            )
            .execute(self.pool.as_ref())
            .await?;
            Ok::<_, RegistrarError>(())
        })
        .await
    }
}

#[async_trait]
impl MatchingRegistrar for PgMatchingRegistrar {
    async fn put(&self, player_id: &str, match_id: MatchId) -> RegistrarResult<()> {
        let inserted = with_timeout(self.timeout, async {
            let result = sqlx::query(
                r#"
                INSERT INTO matching_players (player_id, match_id)
                VALUES ($1, $2)
                ON CONFLICT (player_id) DO NOTHING
                "#,
            )
            .bind(player_id)
            .bind(match_id)
            .execute(self.pool.as_ref())
            .await?;
            Ok::<_, RegistrarError>(result.rows_affected())
        })
        .await?;

        if inserted == 0 {
            return Err(RegistrarError::AlreadyExists {
                player_id: player_id.to_string(),
                match_id: None,
            });
        }

        Ok(())
    }

    async fn remove(&self, player_id: &str) -> RegistrarResult<()> {
        with_timeout(self.timeout, async {
            sqlx::query("DELETE FROM matching_players WHERE player_id = $1")
                .bind(player_id)
                .execute(self.pool.as_ref())
                .await?;
            Ok::<_, RegistrarError>(())
        })
        .await
    }
}
