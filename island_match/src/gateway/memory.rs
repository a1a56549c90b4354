//! Single-process matching registrar.

use super::{MatchingRegistrar, RegistrarError, RegistrarResult};
use crate::matchmaking::{MatchId, PlayerId};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Registrar backed by a process-local map.
///
/// Only enforces uniqueness within one process. Use [`super::PgMatchingRegistrar`]
/// when more than one instance serves the same players.
#[derive(Clone, Default)]
pub struct InMemoryRegistrar {
    entries: Arc<RwLock<HashMap<PlayerId, MatchId>>>,
}

impl InMemoryRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the player currently holds an entry
    pub async fn contains(&self, player_id: &str) -> bool {
        self.entries.read().await.contains_key(player_id)
    }

    /// Match the player is registered in, if any
    pub async fn match_of(&self, player_id: &str) -> Option<MatchId> {
        self.entries.read().await.get(player_id).copied()
    }

    /// Number of registered players
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MatchingRegistrar for InMemoryRegistrar {
    async fn put(&self, player_id: &str, match_id: MatchId) -> RegistrarResult<()> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(player_id) {
            return Err(RegistrarError::AlreadyExists {
                player_id: player_id.to_string(),
                match_id: Some(*existing),
            });
        }
        entries.insert(player_id.to_string(), match_id);
        Ok(())
    }

    async fn remove(&self, player_id: &str) -> RegistrarResult<()> {
        self.entries.write().await.remove(player_id);
        Ok(())
    }
}
