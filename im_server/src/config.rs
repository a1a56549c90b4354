//! Server configuration management.
//!
//! Consolidates all environment variable reads and loads the per-domain match
//! configuration files.

use island_match::{MatchConfig, db::DatabaseConfig};
use std::{
    collections::HashSet,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

/// Default HTTP bind address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 7070);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP bind address
    pub bind: SocketAddr,
    /// Directory holding one `*.json` file per match domain
    pub match_config_dir: PathBuf,
    /// Seconds between sweeps
    pub sweep_interval_secs: u64,
    /// Timeout applied to every collaborator call
    pub rpc_timeout_secs: u64,
    /// Game-execution tier base URL
    pub game_gateway_url: String,
    /// Account tier base URL
    pub account_gateway_url: String,
    /// Client push service base URL
    pub push_gateway_url: String,
    /// Where registrar entries live
    pub registrar: RegistrarBackend,
    /// Prometheus listener, if metrics are exported
    pub metrics_bind: Option<SocketAddr>,
}

/// Matching registrar backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarBackend {
    /// Process-local map; only safe with a single instance
    Memory,
    /// Shared PostgreSQL table
    Postgres(DatabaseConfig),
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `config_dir_override` - Optional match config directory override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        config_dir_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let match_config_dir = config_dir_override
            .or_else(|| std::env::var("MATCH_CONFIG_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("etc/match"));

        let registrar = match std::env::var("REGISTRAR_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => RegistrarBackend::Memory,
            "postgres" => RegistrarBackend::Postgres(DatabaseConfig::from_env().ok_or_else(
                || ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Required when REGISTRAR_BACKEND=postgres".to_string(),
                },
            )?),
            other => {
                return Err(ConfigError::Invalid {
                    var: "REGISTRAR_BACKEND".to_string(),
                    reason: format!("Unknown backend '{}', expected memory or postgres", other),
                });
            }
        };

        Ok(ServerConfig {
            bind,
            match_config_dir,
            sweep_interval_secs: parse_env_or("SWEEP_INTERVAL_SECS", 60),
            rpc_timeout_secs: parse_env_or("RPC_TIMEOUT_SECS", 5),
            game_gateway_url: required("GAME_GATEWAY_URL", "e.g. http://127.0.0.1:7100")?,
            account_gateway_url: required("ACCOUNT_GATEWAY_URL", "e.g. http://127.0.0.1:7200")?,
            push_gateway_url: required("PUSH_GATEWAY_URL", "e.g. http://127.0.0.1:7300")?,
            registrar,
            metrics_bind: parse_env("METRICS_BIND")?,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SWEEP_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rpc_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "RPC_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        for (var, url) in [
            ("GAME_GATEWAY_URL", &self.game_gateway_url),
            ("ACCOUNT_GATEWAY_URL", &self.account_gateway_url),
            ("PUSH_GATEWAY_URL", &self.push_gateway_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }

        if let RegistrarBackend::Postgres(db) = &self.registrar
            && db.min_connections > db.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!("Cannot exceed DB_MAX_CONNECTIONS ({})", db.max_connections),
            });
        }

        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Load every `*.json` match config in `dir`, in file-name order.
///
/// Unparsable or invalid files are logged and skipped; when two files declare
/// the same match id the first one wins.
///
/// # Errors
///
/// Returns error if the directory itself cannot be read
pub fn load_match_configs(dir: &Path) -> Result<Vec<MatchConfig>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::MatchDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut seen = HashSet::new();
    let mut configs = Vec::with_capacity(paths.len());

    for path in paths {
        let config = match read_match_config(&path) {
            Ok(config) => config,
            Err(reason) => {
                log::warn!("Skipping match config {}: {}", path.display(), reason);
                continue;
            }
        };

        if !seen.insert(config.match_id) {
            log::warn!(
                "Skipping match config {}: match {} already loaded",
                path.display(),
                config.match_id
            );
            continue;
        }

        log::info!("Loaded match config {} (match {})", path.display(), config.match_id);
        configs.push(config);
    }

    Ok(configs)
}

fn read_match_config(path: &Path) -> Result<MatchConfig, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let config: MatchConfig = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    config.validate()?;
    Ok(config)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Cannot read match config directory {}: {source}", .path.display())]
    MatchDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional variable; a present but malformed value is an error
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

fn required(key: &str, hint: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingRequired {
        var: key.to_string(),
        hint: hint.to_string(),
    })
}
