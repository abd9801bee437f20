//! Configuration for the membership engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Membership configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Fixed fee for one verification window
    pub verification_fee: Decimal,

    /// Seconds between expiry sweep passes
    pub sweep_interval_secs: u64,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            verification_fee: Decimal::new(500000, 2), // 5000.00
            sweep_interval_secs: 3600,                 // hourly
        }
    }
}

impl MembershipConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: MembershipConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject nonsensical settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.verification_fee <= Decimal::ZERO {
            return Err(crate::Error::Config(format!(
                "Verification fee must be positive, got {}",
                self.verification_fee
            )));
        }

        if self.sweep_interval_secs == 0 {
            return Err(crate::Error::Config(
                "Sweep interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MembershipConfig::default();
        assert_eq!(config.verification_fee, Decimal::new(500000, 2));
        assert_eq!(config.sweep_interval_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_fee() {
        let mut config = MembershipConfig::default();
        config.verification_fee = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = MembershipConfig::default();
        config.sweep_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
