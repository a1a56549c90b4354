//! Remote call timeout helpers
//!
//! Bounds calls to external collaborators so a stalled tier can never hang a
//! request handler or the sweep.

use super::errors::{GatewayError, RegistrarError};
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for collaborator calls (5 seconds)
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline elapsed before the wrapped call completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Remote call timed out after {0:?}")]
pub struct Elapsed(pub Duration);

impl From<Elapsed> for RegistrarError {
    fn from(elapsed: Elapsed) -> Self {
        RegistrarError::Timeout(elapsed.0)
    }
}

impl From<Elapsed> for GatewayError {
    fn from(elapsed: Elapsed) -> Self {
        GatewayError::Timeout(elapsed.0)
    }
}

/// Execute a fallible remote call with a deadline
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Remote call to execute
///
/// # Returns
///
/// * `Result<T, E>` - The call's own result, or `E::from(Elapsed)` on timeout
///
/// # Example
///
/// ```no_run
/// use island_match::gateway::timeouts::{with_timeout, DEFAULT_RPC_TIMEOUT};
/// use island_match::gateway::RegistrarError;
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), RegistrarError> {
///
/// let removed = with_timeout(DEFAULT_RPC_TIMEOUT, async {
///     sqlx::query("DELETE FROM matching_players WHERE player_id = $1")
///         .bind("u1")
///         .execute(pool)
///         .await
///         .map_err(RegistrarError::from)
/// })
/// .await?;
/// # let _ = removed;
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: From<Elapsed>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Elapsed(duration).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result: Result<u32, GatewayError> =
            with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_maps_elapsed() {
        let result: Result<(), RegistrarError> = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(RegistrarError::Timeout(d)) if d == Duration::from_millis(50)));
    }
}
