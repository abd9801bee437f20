//! Configuration for presence tracking

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Presence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Data directory for the presence store
    pub data_dir: PathBuf,

    /// Seconds a heartbeat keeps an account online
    pub ttl_secs: u64,

    /// Seconds between stale-row sweeps
    pub sweep_interval_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/presence"),
            ttl_secs: 300,          // 5 minutes
            sweep_interval_secs: 60,
        }
    }
}

impl PresenceConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PresenceConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PresenceConfig::default();
        assert_eq!(config.ttl_secs, 300);
        assert!(config.sweep_interval_secs > 0);
    }
}
