use chrono::Duration;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::expiry::LicenseType;
use crate::serial::DEFAULT_PREFIX;
use crate::status::EXPIRING_SOON_DAYS;

const MAX_EXPIRING_SOON_DAYS: u32 = 3650;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ConfigError {
    #[error("malformed console config: {0}")]
    Malformed(String),
    #[error("serial prefix `{0}` must be non-empty uppercase ASCII letters or digits")]
    InvalidPrefix(String),
    #[error("expiring-soon window of {0} days is out of range")]
    InvalidWindow(u32),
}

/// Settings shared by the generation form and the license list.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub serial_prefix: String,
    pub expiring_soon_days: u32,
    pub default_product: String,
    pub default_license_type: LicenseType,
    pub default_constraint: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            serial_prefix: DEFAULT_PREFIX.to_owned(),
            expiring_soon_days: EXPIRING_SOON_DAYS as u32,
            default_product: "PlaceDB".to_owned(),
            default_license_type: LicenseType::OneMonth,
            default_constraint: "HWID".to_owned(),
        }
    }
}

impl ConsoleConfig {
    /// Reads a config object; missing keys take the console defaults.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix_ok = !self.serial_prefix.is_empty()
            && self
                .serial_prefix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !prefix_ok {
            return Err(ConfigError::InvalidPrefix(self.serial_prefix.clone()));
        }

        if self.expiring_soon_days == 0 || self.expiring_soon_days > MAX_EXPIRING_SOON_DAYS {
            return Err(ConfigError::InvalidWindow(self.expiring_soon_days));
        }

        Ok(())
    }

    pub fn expiring_soon_window(&self) -> Duration {
        Duration::days(i64::from(self.expiring_soon_days))
    }
}
