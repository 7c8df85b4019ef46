//! Configuration management for Replichain

use crate::error::{ChainError, Result};
use crate::pow::{DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub mining: MiningConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MiningConfig {
    /// Leading zero hex characters a winning digest must have. Deployments
    /// have run with both 4 and 5; 4 is the documented default.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Upper bound on the proof search per mining attempt.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,
    /// Amount credited to the miner per sealed block.
    #[serde(default = "default_reward_amount")]
    pub reward_amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Per-peer request timeout during conflict resolution.
    #[serde(default = "default_peer_timeout_secs")]
    pub peer_timeout_secs: u64,
    /// Seconds between background resolution passes. 0 disables the loop.
    #[serde(default = "default_resolve_interval_secs")]
    pub resolve_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            difficulty: default_difficulty(),
            max_attempts: default_max_attempts(),
            reward_amount: default_reward_amount(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            peer_timeout_secs: default_peer_timeout_secs(),
            resolve_interval_secs: default_resolve_interval_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network: NetworkConfig::default(),
            mining: MiningConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

fn default_api_port() -> u16 {
    5000
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_max_attempts() -> u64 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_reward_amount() -> u64 {
    1
}

fn default_peer_timeout_secs() -> u64 {
    5
}

fn default_resolve_interval_secs() -> u64 {
    60
}

/// Load configuration from `path`, falling back to defaults when the file is
/// absent.
pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)
            .map_err(|e| ChainError::Config(format!("{}: {}", path, e)))?
    };

    // A hex digest has 64 characters; anything past that can never match.
    if config.mining.difficulty == 0 || config.mining.difficulty > 64 {
        return Err(ChainError::Config(format!(
            "mining.difficulty must be between 1 and 64, got {}",
            config.mining.difficulty
        )));
    }

    if config.mining.max_attempts == 0 {
        return Err(ChainError::Config(
            "mining.max_attempts must be greater than zero".to_string(),
        ));
    }

    Ok(config)
}
