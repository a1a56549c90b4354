//! Match domain configuration.

use super::MatchId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rest window before an idle resting player is dropped (8 minutes)
pub const DEFAULT_REST_TIMEOUT_SECS: u64 = 480;

/// Forming-table idle time before a bot is seated
pub const DEFAULT_BOT_IDLE_SECS: u64 = 10;

/// Registrar removals one housekeeping pass may issue for a match
pub const MAX_EXPIRIES_PER_SWEEP: usize = 32;

/// Configuration of one matchmaking domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Match domain id
    pub match_id: MatchId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Players per table; a table dispatches when it reaches this count
    pub player_per_table: usize,

    /// Game type passed through to the game tier
    pub game_type: String,

    /// Stake of each table
    pub score_base: i64,

    /// Starting score of a new player record
    #[serde(default)]
    pub initial_chips: i64,

    /// Whether stalled forming tables are filled with bots
    #[serde(default)]
    pub bots_enabled: bool,

    /// Seconds a player may rest before being removed
    #[serde(default = "default_rest_timeout_secs")]
    pub rest_timeout_secs: u64,

    /// Seconds a forming table may go without a new player before backfill
    #[serde(default = "default_bot_idle_secs")]
    pub bot_idle_secs: u64,
}

fn default_rest_timeout_secs() -> u64 {
    DEFAULT_REST_TIMEOUT_SECS
}

fn default_bot_idle_secs() -> u64 {
    DEFAULT_BOT_IDLE_SECS
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_id: 1,
            name: "Default Match".to_string(),
            player_per_table: 4,
            game_type: "mahjong".to_string(),
            score_base: 1,
            initial_chips: 0,
            bots_enabled: false,
            rest_timeout_secs: DEFAULT_REST_TIMEOUT_SECS,
            bot_idle_secs: DEFAULT_BOT_IDLE_SECS,
        }
    }
}

impl MatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=16).contains(&self.player_per_table) {
            return Err("Players per table must be between 2 and 16".to_string());
        }

        if self.score_base <= 0 {
            return Err("Score base must be positive".to_string());
        }

        if self.initial_chips < 0 {
            return Err("Initial chips cannot be negative".to_string());
        }

        if self.game_type.trim().is_empty() {
            return Err("Game type must not be empty".to_string());
        }

        if self.rest_timeout_secs == 0 {
            return Err("Rest timeout must be greater than 0".to_string());
        }

        if self.bots_enabled && self.bot_idle_secs == 0 {
            return Err("Bot idle threshold must be greater than 0 when bots are enabled".to_string());
        }

        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.player_per_table
    }

    pub fn rest_timeout(&self) -> Duration {
        Duration::from_secs(self.rest_timeout_secs)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.bot_idle_secs)
    }
}
