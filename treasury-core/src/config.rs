//! Configuration for the treasury

use crate::types::Coins;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Treasury configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for snapshot files
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Economy constants
    pub economy: EconomyConfig,

    /// Flush (write-behind persistence) configuration
    pub flush: FlushConfig,

    /// Mute sweep configuration
    pub sweep: SweepConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/treasury"),
            service_name: "treasury-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            economy: EconomyConfig::default(),
            flush: FlushConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

/// Economy constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Balance granted on registration
    pub starting_balance: Coins,

    /// Weekly claim payout
    pub weekly_reward: Coins,

    /// Days between weekly claims
    pub weekly_interval_days: i64,

    /// Base payout when the message counter wraps (before multiplier)
    pub message_reward: Coins,

    /// Messages needed for one activity payout
    pub messages_per_reward: u32,

    /// Hours between beg attempts
    pub beg_cooldown_hours: i64,

    /// Probability that a beg pays out
    pub beg_win_odds: f64,

    /// Smallest beg payout (inclusive)
    pub beg_reward_min: Coins,

    /// Largest beg payout (inclusive)
    pub beg_reward_max: Coins,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: 100,
            weekly_reward: 100,
            weekly_interval_days: 7,
            message_reward: 50,
            messages_per_reward: 100,
            beg_cooldown_hours: 24,
            beg_win_odds: 0.5,
            beg_reward_min: 20,
            beg_reward_max: 100,
        }
    }
}

/// Flush configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushConfig {
    /// Quiet window before a debounced snapshot write (milliseconds)
    pub debounce_ms: u64,

    /// Write attempts before giving up and logging
    pub write_retries: u32,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 5_000,
            write_retries: 3,
        }
    }
}

/// Mute sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between expiry sweeps
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TREASURY_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(ms) = std::env::var("TREASURY_FLUSH_DEBOUNCE_MS") {
            config.flush.debounce_ms = ms
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid debounce: {}", e)))?;
        }

        if let Ok(secs) = std::env::var("TREASURY_SWEEP_INTERVAL_SECS") {
            config.sweep.interval_secs = secs
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid sweep interval: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "treasury-core");
        assert_eq!(config.economy.starting_balance, 100);
        assert_eq!(config.economy.messages_per_reward, 100);
        assert_eq!(config.sweep.interval_secs, 60);
    }

    #[test]
    fn test_config_round_trip_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.economy.weekly_reward, config.economy.weekly_reward);
        assert_eq!(parsed.flush.debounce_ms, config.flush.debounce_ms);
    }
}
