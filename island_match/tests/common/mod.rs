//! Recording collaborators shared by the matchmaking integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use island_match::{
    AccountGateway, BotIdentity, ClientNotification, ClientNotifier, CreateTableRequest,
    GameGateway, GatewayError, Gateways, InMemoryRegistrar, Match, MatchConfig, MatchId,
    MatchingRegistrar, RegistrarError, TableId,
    gateway::{GatewayResult, RegistrarResult},
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// In-memory registrar with switchable failures
#[derive(Default)]
pub struct MockRegistrar {
    pub inner: InMemoryRegistrar,
    pub fail_put: AtomicBool,
    pub fail_remove: AtomicBool,
}

#[async_trait]
impl MatchingRegistrar for MockRegistrar {
    async fn put(&self, player_id: &str, match_id: MatchId) -> RegistrarResult<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(RegistrarError::Unavailable("registrar down".to_string()));
        }
        self.inner.put(player_id, match_id).await
    }

    async fn remove(&self, player_id: &str) -> RegistrarResult<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(RegistrarError::Unavailable("registrar down".to_string()));
        }
        self.inner.remove(player_id).await
    }
}

/// Calls received by the game tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCall {
    CreateTable {
        table_id: TableId,
        game_type: String,
        score_base: i64,
    },
    AddPlayer {
        table_id: TableId,
        player_id: String,
        seat: usize,
    },
    StartClient {
        player_id: String,
    },
    RequestExit {
        table_id: TableId,
        player_id: String,
    },
    NetState {
        table_id: TableId,
        player_id: String,
        online: bool,
    },
}

/// Game tier that records every call
#[derive(Default)]
pub struct RecordingGame {
    pub calls: Mutex<Vec<GameCall>>,
    pub fail_create: AtomicBool,
    pub fail_exit: AtomicBool,
    /// Exit answers wait while a writer holds this
    pub exit_gate: tokio::sync::RwLock<()>,
}

impl RecordingGame {
    pub fn calls(&self) -> Vec<GameCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<TableId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GameCall::CreateTable { table_id, .. } => Some(table_id),
                _ => None,
            })
            .collect()
    }

    pub fn adds(&self) -> Vec<(TableId, String, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GameCall::AddPlayer {
                    table_id,
                    player_id,
                    seat,
                } => Some((table_id, player_id, seat)),
                _ => None,
            })
            .collect()
    }

    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GameCall::StartClient { player_id } => Some(player_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GameCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GameGateway for RecordingGame {
    async fn create_table(&self, request: &CreateTableRequest) -> GatewayResult<()> {
        self.record(GameCall::CreateTable {
            table_id: request.table_id,
            game_type: request.game_type.clone(),
            score_base: request.score_base,
        });
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("no capacity".to_string()));
        }
        Ok(())
    }

    async fn add_player(
        &self,
        _match_id: MatchId,
        table_id: TableId,
        player_id: &str,
        seat: usize,
    ) -> GatewayResult<()> {
        self.record(GameCall::AddPlayer {
            table_id,
            player_id: player_id.to_string(),
            seat,
        });
        Ok(())
    }

    async fn start_client(&self, _match_id: MatchId, player_id: &str) -> GatewayResult<()> {
        self.record(GameCall::StartClient {
            player_id: player_id.to_string(),
        });
        Ok(())
    }

    async fn request_exit(
        &self,
        _match_id: MatchId,
        table_id: TableId,
        player_id: &str,
    ) -> GatewayResult<()> {
        self.record(GameCall::RequestExit {
            table_id,
            player_id: player_id.to_string(),
        });
        let _open = self.exit_gate.read().await;
        if self.fail_exit.load(Ordering::SeqCst) {
            return Err(GatewayError::Timeout(Duration::from_secs(5)));
        }
        Ok(())
    }

    async fn push_net_state(
        &self,
        _match_id: MatchId,
        table_id: TableId,
        player_id: &str,
        online: bool,
    ) -> GatewayResult<()> {
        self.record(GameCall::NetState {
            table_id,
            player_id: player_id.to_string(),
            online,
        });
        Ok(())
    }
}

/// Account tier handing out queued bot identities
#[derive(Default)]
pub struct BotPool {
    pub identities: Mutex<VecDeque<BotIdentity>>,
    pub requests: Mutex<usize>,
}

impl BotPool {
    pub fn push(&self, id: &str, valid_for: chrono::Duration) {
        self.identities.lock().unwrap().push_back(BotIdentity {
            id: id.to_string(),
            expires_at: Utc::now() + valid_for,
        });
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

#[async_trait]
impl AccountGateway for BotPool {
    async fn get_bot_identity(&self) -> GatewayResult<BotIdentity> {
        *self.requests.lock().unwrap() += 1;
        self.identities
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::Unavailable("no bots left".to_string()))
    }
}

/// Push channel that records every notification
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, ClientNotification)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, ClientNotification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, player_id: &str) -> Vec<ClientNotification> {
        self.sent()
            .into_iter()
            .filter(|(p, _)| p == player_id)
            .map(|(_, n)| n)
            .collect()
    }
}

#[async_trait]
impl ClientNotifier for RecordingNotifier {
    async fn notify(&self, player_id: &str, notification: ClientNotification) -> GatewayResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((player_id.to_string(), notification));
        Ok(())
    }
}

/// Every mock, plus the `Gateways` bundle wired to them
#[derive(Default)]
pub struct Harness {
    pub registrar: Arc<MockRegistrar>,
    pub game: Arc<RecordingGame>,
    pub accounts: Arc<BotPool>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateways(&self) -> Gateways {
        Gateways {
            registrar: self.registrar.clone(),
            game: self.game.clone(),
            accounts: self.accounts.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub fn start(&self, config: MatchConfig) -> Arc<Match> {
        Arc::new(Match::new(config, self.gateways()))
    }
}

/// Config with the given capacity and everything else defaulted
pub fn config(match_id: MatchId, capacity: usize) -> MatchConfig {
    MatchConfig {
        match_id,
        name: format!("match-{}", match_id),
        player_per_table: capacity,
        ..MatchConfig::default()
    }
}

/// Let spawned dispatch tasks run until `done` holds
pub async fn settle<F: Fn() -> bool>(done: F) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
