//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::game::combat::DEFAULT_HIT_RANGE;
use crate::util::time::TICK_RATE_HZ;

/// Default listen address
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:9001";

/// Team score that ends the match
pub const DEFAULT_WIN_SCORE: u32 = 20;

/// Highest accepted simulation rate; each fixed step runs under the roster lock
pub const MAX_TICK_RATE_HZ: f64 = 1000.0;

/// Simulation knobs for one match
#[derive(Clone, Debug)]
pub struct GameRules {
    /// Fixed simulation rate (ticks per second)
    pub tick_rate_hz: f64,
    /// Maximum hitscan range in world units
    pub hit_range: f32,
    /// Team score that declares a winner
    pub win_score: u32,
    /// Seed for spawn placement; random when unset
    pub spawn_seed: Option<u64>,
}

impl GameRules {
    /// Reject rates and ranges the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz > 0.0 && self.tick_rate_hz <= MAX_TICK_RATE_HZ) {
            return Err(ConfigError::Invalid {
                var: "TICK_RATE_HZ",
                value: self.tick_rate_hz.to_string(),
            });
        }
        if !(self.hit_range.is_finite() && self.hit_range > 0.0) {
            return Err(ConfigError::Invalid {
                var: "HIT_RANGE",
                value: self.hit_range.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ,
            hit_range: DEFAULT_HIT_RANGE,
            win_score: DEFAULT_WIN_SCORE,
            spawn_seed: None,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    pub rules: GameRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 9001)),
            log_level: "info".to_string(),
            log_json: false,
            rules: GameRules::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR when both are set
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string())
        };

        let defaults = GameRules::default();
        let rules = GameRules {
            tick_rate_hz: parse_var("TICK_RATE_HZ")?.unwrap_or(defaults.tick_rate_hz),
            hit_range: parse_var("HIT_RANGE")?.unwrap_or(defaults.hit_range),
            win_score: parse_var("WIN_SCORE")?.unwrap_or(defaults.win_score),
            spawn_seed: parse_var("SPAWN_SEED")?,
        };

        rules.validate()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: matches!(env::var("LOG_FORMAT").as_deref(), Ok("json")),
            rules,
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
