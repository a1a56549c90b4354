//! HTTP clients for the game, account and push tiers.
//!
//! Every call carries the configured RPC timeout. Responses are mapped onto
//! [`GatewayError`]: a non-2xx status is `Rejected`, an elapsed deadline is
//! `Timeout`, a body that does not decode is `InvalidResponse` and any other
//! transport failure is `Unavailable`.

use async_trait::async_trait;
use island_match::{
    AccountGateway, BotIdentity, ClientNotification, ClientNotifier, CreateTableRequest,
    GameGateway, GatewayError, MatchId, TableId, gateway::GatewayResult,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use std::time::Duration;

/// JSON-over-HTTP client bound to one base URL
#[derive(Debug, Clone)]
struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Base URL extended by `segments`, each one percent-encoded
    fn url(&self, segments: &[&str]) -> GatewayResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            GatewayError::Unavailable(format!("invalid base url {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Unavailable(format!("base url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> GatewayResult<reqwest::Response> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{}: {}", status, body.trim())));
        }
        Ok(response)
    }

    async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> GatewayResult<()> {
        let url = self.url(segments)?;
        log::debug!("POST {}", url);
        self.send(self.client.post(url).json(body)).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> GatewayResult<T> {
        let url = self.url(segments)?;
        log::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        response.json().await.map_err(|e| self.map_error(e))
    }
}

/// Game-execution tier over HTTP
#[derive(Debug, Clone)]
pub struct HttpGameGateway {
    http: HttpClient,
}

impl HttpGameGateway {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(client, base_url, timeout),
        }
    }
}

#[async_trait]
impl GameGateway for HttpGameGateway {
    async fn create_table(&self, request: &CreateTableRequest) -> GatewayResult<()> {
        self.http.post(&["tables"], request).await
    }

    async fn add_player(
        &self,
        match_id: MatchId,
        table_id: TableId,
        player_id: &str,
        seat: usize,
    ) -> GatewayResult<()> {
        self.http
            .post(
                &["tables", &table_id.to_string(), "players"],
                &json!({ "match_id": match_id, "player_id": player_id, "seat": seat }),
            )
            .await
    }

    async fn start_client(&self, match_id: MatchId, player_id: &str) -> GatewayResult<()> {
        self.http
            .post(
                &["clients", "start"],
                &json!({ "match_id": match_id, "player_id": player_id }),
            )
            .await
    }

    async fn request_exit(
        &self,
        match_id: MatchId,
        table_id: TableId,
        player_id: &str,
    ) -> GatewayResult<()> {
        self.http
            .post(
                &["tables", &table_id.to_string(), "exit"],
                &json!({ "match_id": match_id, "player_id": player_id }),
            )
            .await
    }

    async fn push_net_state(
        &self,
        match_id: MatchId,
        table_id: TableId,
        player_id: &str,
        online: bool,
    ) -> GatewayResult<()> {
        self.http
            .post(
                &["tables", &table_id.to_string(), "net-state"],
                &json!({ "match_id": match_id, "player_id": player_id, "online": online }),
            )
            .await
    }
}

/// Account tier over HTTP
#[derive(Debug, Clone)]
pub struct HttpAccountGateway {
    http: HttpClient,
}

impl HttpAccountGateway {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(client, base_url, timeout),
        }
    }
}

#[async_trait]
impl AccountGateway for HttpAccountGateway {
    async fn get_bot_identity(&self) -> GatewayResult<BotIdentity> {
        self.http.get(&["bots", "identity"]).await
    }
}

/// Push tier over HTTP
#[derive(Debug, Clone)]
pub struct HttpClientNotifier {
    http: HttpClient,
}

impl HttpClientNotifier {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(client, base_url, timeout),
        }
    }
}

#[async_trait]
impl ClientNotifier for HttpClientNotifier {
    async fn notify(&self, player_id: &str, notification: ClientNotification) -> GatewayResult<()> {
        self.http
            .post(&["players", player_id, "notifications"], &notification)
            .await
    }
}
