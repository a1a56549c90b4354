//! Matchmaking server entry point.
//!
//! Loads the match domains, wires the registrar and the remote tiers, runs the
//! periodic sweep and serves the HTTP API until Ctrl+C.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use im_server::{
    api,
    config::{RegistrarBackend, ServerConfig, load_match_configs},
    logging, metrics,
    remote::{HttpAccountGateway, HttpClientNotifier, HttpGameGateway},
};
use island_match::{
    Gateways, InMemoryRegistrar, MatchManager, MatchingRegistrar, PgMatchingRegistrar,
    db::Database,
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run the matchmaking server

USAGE:
  im_server [OPTIONS]

OPTIONS:
  --bind        IP:PORT    Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7070]
  --config-dir  PATH       Match config directory      [default: env MATCH_CONFIG_DIR or etc/match]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  GAME_GATEWAY_URL         Game tier base URL (required)
  ACCOUNT_GATEWAY_URL      Account tier base URL (required)
  PUSH_GATEWAY_URL         Push tier base URL (required)
  REGISTRAR_BACKEND        memory | postgres  [default: memory]
  DATABASE_URL             PostgreSQL connection string (postgres backend)
  SWEEP_INTERVAL_SECS      Seconds between sweeps  [default: 60]
  RPC_TIMEOUT_SECS         Remote call timeout  [default: 5]
  METRICS_BIND             Prometheus listener address (optional)
";

struct Args {
    bind: Option<SocketAddr>,
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        config_dir: pargs.opt_value_from_str("--config-dir")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.config_dir)?;
    config.validate()?;
    info!("Starting matchmaking server at {}", config.bind);

    let match_configs = load_match_configs(&config.match_config_dir)?;
    info!(
        "Loaded {} match config(s) from {}",
        match_configs.len(),
        config.match_config_dir.display()
    );

    let registrar: Arc<dyn MatchingRegistrar> = match &config.registrar {
        RegistrarBackend::Memory => {
            info!("Using in-memory registrar");
            Arc::new(InMemoryRegistrar::new())
        }
        RegistrarBackend::Postgres(db_config) => {
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            info!("Database connected successfully");

            let registrar =
                PgMatchingRegistrar::new(Arc::new(db.pool().clone()), config.rpc_timeout());
            registrar
                .ensure_schema()
                .await
                .context("Failed to prepare registrar schema")?;
            Arc::new(registrar)
        }
    };

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let timeout = config.rpc_timeout();
    let gateways = Gateways {
        registrar,
        game: Arc::new(HttpGameGateway::new(
            client.clone(),
            &config.game_gateway_url,
            timeout,
        )),
        accounts: Arc::new(HttpAccountGateway::new(
            client.clone(),
            &config.account_gateway_url,
            timeout,
        )),
        notifier: Arc::new(HttpClientNotifier::new(
            client,
            &config.push_gateway_url,
            timeout,
        )),
    };

    let manager = Arc::new(MatchManager::new(match_configs, gateways));
    if manager.is_empty() {
        log::warn!("No valid match configs loaded; every match request will be rejected");
    }
    for m in manager.matches() {
        let cfg = m.config();
        info!(
            "  - {} (ID: {}) - {} per table, game {}, bots {}",
            cfg.name,
            cfg.match_id,
            cfg.player_per_table,
            cfg.game_type,
            if cfg.bots_enabled { "on" } else { "off" }
        );
    }

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Metrics available at http://{}/metrics", addr);
    }

    let sweeper = manager
        .clone()
        .spawn_sweeper(config.sweep_interval(), |manager, report| async move {
            metrics::record_sweep(&report);
            metrics::refresh_match_gauges(&manager).await;
        });

    let app = api::create_router(api::AppState { manager });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    sweeper.abort();

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
