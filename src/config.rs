//! Service configuration from environment variables

use chrono::TimeDelta;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::prize::PrizeTable;
use crate::session::{GameRules, DEFAULT_TIME_LIMIT_MINUTES};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Minutes a player has for one whole game
    pub time_limit_minutes: i64,
    /// JSON file with question records (None = generated placeholder questions)
    pub questions_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    /// Mount `/api/state/export` and `/api/state/import`. They reveal answers
    /// and overwrite balances, so they stay off unless asked for.
    pub state_routes_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            questions_path: None,
            bind_addr: default_bind_addr(),
            state_routes_enabled: false,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let time_limit_minutes = match std::env::var("GAME_TIME_LIMIT_MINUTES") {
            Ok(value) => parse_time_limit(&value).unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid GAME_TIME_LIMIT_MINUTES '{}', falling back to {}",
                    value,
                    DEFAULT_TIME_LIMIT_MINUTES
                );
                DEFAULT_TIME_LIMIT_MINUTES
            }),
            Err(_) => DEFAULT_TIME_LIMIT_MINUTES,
        };

        let questions_path = std::env::var("QUESTIONS_PATH").ok().and_then(|path| {
            let trimmed = path.trim();
            (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
        });

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(addr) => addr.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid BIND_ADDR '{}', falling back to {}",
                    addr,
                    DEFAULT_BIND_ADDR
                );
                default_bind_addr()
            }),
            Err(_) => default_bind_addr(),
        };

        let state_routes_enabled = std::env::var("STATE_ROUTES_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            time_limit_minutes,
            questions_path,
            bind_addr,
            state_routes_enabled,
        }
    }

    pub fn rules(&self) -> GameRules {
        let time_limit = TimeDelta::try_minutes(self.time_limit_minutes)
            .filter(|limit| *limit > TimeDelta::zero())
            .unwrap_or_else(|| TimeDelta::minutes(DEFAULT_TIME_LIMIT_MINUTES));
        GameRules {
            prizes: PrizeTable::default(),
            time_limit,
        }
    }
}

/// Positive minute count that fits in a [`TimeDelta`]
fn parse_time_limit(value: &str) -> Option<i64> {
    let minutes = value.trim().parse::<i64>().ok()?;
    (minutes > 0 && TimeDelta::try_minutes(minutes).is_some()).then_some(minutes)
}
