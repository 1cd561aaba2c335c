//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::game::{FleetSelection, PlaybackConfig, MAX_SHIPS};

/// Fleet the training opponent fields
pub const DEFAULT_TRAINING_OPPONENT: FleetSelection = [35, 25, 15, 10];
/// Fleet the player fields in a training fight
pub const DEFAULT_TRAINING_FLEET: FleetSelection = [20, 20, 10, 12];

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Minimum hold after each attack action, in milliseconds
    pub action_hold_ms: u64,
    /// Lane change duration, in milliseconds
    pub travel_ms: u64,
    /// Stop presenting once a fleet has no units left
    pub short_circuit: bool,

    /// JSON ship catalog; the reference ships are used when unset
    pub ship_catalog_path: Option<PathBuf>,
    /// Wire-format fight record to replay
    pub fight_record_path: Option<PathBuf>,

    /// Seed for the training fight; random when unset
    pub training_seed: Option<u64>,
    pub training_fleet: FleetSelection,
    pub training_opponent: FleetSelection,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            action_hold_ms: parse_var(&lookup, "REPLAY_ACTION_HOLD_MS")?.unwrap_or(500),
            travel_ms: parse_var(&lookup, "REPLAY_TRAVEL_MS")?.unwrap_or(1000),
            short_circuit: parse_var(&lookup, "REPLAY_SHORT_CIRCUIT")?.unwrap_or(true),

            ship_catalog_path: lookup("SHIP_CATALOG_PATH").map(PathBuf::from),
            fight_record_path: lookup("FIGHT_RECORD_PATH").map(PathBuf::from),

            training_seed: parse_var(&lookup, "TRAINING_SEED")?,
            training_fleet: parse_fleet(&lookup, "TRAINING_FLEET")?
                .unwrap_or(DEFAULT_TRAINING_FLEET),
            training_opponent: parse_fleet(&lookup, "TRAINING_OPPONENT")?
                .unwrap_or(DEFAULT_TRAINING_OPPONENT),
        })
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            action_hold: Duration::from_millis(self.action_hold_ms),
            travel: Duration::from_millis(self.travel_ms),
            short_circuit: self.short_circuit,
        }
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var, value })
        })
        .transpose()
}

/// Comma separated unit counts, one per ship type
fn parse_fleet<F>(lookup: &F, var: &'static str) -> Result<Option<FleetSelection>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    let counts: Option<Vec<u32>> = value.split(',').map(|c| c.trim().parse().ok()).collect();
    counts
        .filter(|c| c.len() == MAX_SHIPS)
        .and_then(|c| c.try_into().ok())
        .map(Some)
        .ok_or(ConfigError::Invalid { var, value })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for environment variable {var}")]
    Invalid { var: &'static str, value: String },
}
