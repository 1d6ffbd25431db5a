//! Runtime configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::ready::DEFAULT_READY_TIMEOUT;
use crate::types::SYNC_INTERVAL_MS;

/// Smallest room a match can be played in.
pub const MIN_PLAYERS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for the file-backed key-value store.
    pub data_dir: PathBuf,
    /// Fixed piece seed; random per game when unset.
    pub seed: Option<u64>,
    /// Snapshot push period in battle mode.
    pub sync_interval: Duration,
    /// Wait ceiling for backend readiness at create/join.
    pub ready_timeout: Duration,
    /// Largest room size a host may create.
    pub max_players: u8,
    /// Log file; no subscriber is installed when unset.
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".blockfall"),
            seed: None,
            sync_interval: Duration::from_millis(u64::from(SYNC_INTERVAL_MS)),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            max_players: 4,
            log_path: None,
        }
    }
}

impl Config {
    /// Create from `BLOCKFALL_*` environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable values fall back to defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .and_then(|s| if s.is_empty() { None } else { Some(s) })
        };

        let data_dir = non_empty("BLOCKFALL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let seed = non_empty("BLOCKFALL_SEED").and_then(|s| s.parse().ok());
        let sync_interval = non_empty("BLOCKFALL_SYNC_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.sync_interval);
        let ready_timeout = non_empty("BLOCKFALL_READY_TIMEOUT_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.ready_timeout);
        let max_players = non_empty("BLOCKFALL_MAX_PLAYERS")
            .and_then(|s| s.parse::<u8>().ok())
            .filter(|n| *n >= MIN_PLAYERS)
            .unwrap_or(defaults.max_players);
        let log_path = non_empty("BLOCKFALL_LOG_PATH").map(PathBuf::from);

        Self {
            data_dir,
            seed,
            sync_interval,
            ready_timeout,
            max_players,
            log_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.sync_interval, Duration::from_millis(200));
        assert_eq!(config.ready_timeout, Duration::from_secs(5));
        assert_eq!(config.max_players, 4);
        assert_eq!(config.data_dir, PathBuf::from(".blockfall"));
    }

    #[test]
    fn parses_overrides() {
        let config = Config::from_vars(lookup(&[
            ("BLOCKFALL_DATA_DIR", "/tmp/bf"),
            ("BLOCKFALL_SEED", "42"),
            ("BLOCKFALL_SYNC_MS", "100"),
            ("BLOCKFALL_READY_TIMEOUT_MS", "250"),
            ("BLOCKFALL_MAX_PLAYERS", "6"),
            ("BLOCKFALL_LOG_PATH", " /tmp/bf.log "),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/bf"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.sync_interval, Duration::from_millis(100));
        assert_eq!(config.ready_timeout, Duration::from_millis(250));
        assert_eq!(config.max_players, 6);
        assert_eq!(config.log_path, Some(PathBuf::from("/tmp/bf.log")));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = Config::from_vars(lookup(&[
            ("BLOCKFALL_SEED", "abc"),
            ("BLOCKFALL_SYNC_MS", "0"),
            ("BLOCKFALL_MAX_PLAYERS", "1"),
            ("BLOCKFALL_LOG_PATH", "   "),
        ]));
        assert_eq!(config.seed, None);
        assert_eq!(config.sync_interval, Duration::from_millis(200));
        assert_eq!(config.max_players, 4);
        assert_eq!(config.log_path, None);
    }

    #[test]
    fn from_env_does_not_panic() {
        let _config = Config::from_env();
    }
}
