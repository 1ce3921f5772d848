//! # Configuration
//!
//! Storage and time-zone settings for the parking till.
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. TOML file (optional)
//! 3. Environment variables
//!
//! ## Environment Variables
//! ```text
//! PARKING_DATABASE_PATH        ./parking.db
//! PARKING_TIMEZONE             America/Sao_Paulo
//! PARKING_DB_MAX_CONNECTIONS   5
//! ```
//!
//! ## Example File
//! ```toml
//! database_path = "/var/lib/parking/parking.db"
//! timezone = "America/Sao_Paulo"
//! max_connections = 5
//! ```

use parking_core::{BusinessClock, DEFAULT_TIMEZONE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::pool::DbConfig;

pub const ENV_DATABASE_PATH: &str = "PARKING_DATABASE_PATH";
pub const ENV_TIMEZONE: &str = "PARKING_TIMEZONE";
pub const ENV_MAX_CONNECTIONS: &str = "PARKING_DB_MAX_CONNECTIONS";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parking till configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// IANA zone used for day windows and stays.
    pub timezone: String,

    /// Pool size.
    pub max_connections: u32,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        ParkingConfig {
            database_path: PathBuf::from("./parking.db"),
            timezone: DEFAULT_TIMEZONE.to_string(),
            max_connections: 5,
        }
    }
}

impl ParkingConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Defaults, then `path` if it exists, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading config from file");
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&contents)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ParkingConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from any key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(tz) = lookup(ENV_TIMEZONE) {
            debug!(timezone = %tz, "Overriding time zone from environment");
            self.timezone = tz;
        }

        if let Some(max) = lookup(ENV_MAX_CONNECTIONS) {
            self.max_connections = max
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_MAX_CONNECTIONS, format!("'{}' is not a number", max)))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::invalid("max_connections", "must be at least 1"));
        }
        self.clock()?;
        Ok(())
    }

    /// The business clock for the configured zone.
    pub fn clock(&self) -> Result<BusinessClock, ConfigError> {
        BusinessClock::from_zone_name(&self.timezone)
            .map_err(|e| ConfigError::invalid("timezone", e.user_message()))
    }

    /// Pool settings for [`Database::new`](crate::Database::new).
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ParkingConfig::default();
        assert_eq!(config.database_path, PathBuf::from("./parking.db"));
        assert_eq!(config.timezone, "America/Sao_Paulo");
        assert_eq!(config.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ParkingConfig::from_toml_str("timezone = \"America/Manaus\"").unwrap();
        assert_eq!(config.timezone, "America/Manaus");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        assert!(ParkingConfig::from_toml_str("timezone = \"Nowhere/City\"").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATABASE_PATH, "/tmp/lot.db"),
            (ENV_MAX_CONNECTIONS, "8"),
        ]);
        let mut config = ParkingConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/lot.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.db_config().max_connections, 8);
    }

    #[test]
    fn test_bad_override() {
        let mut config = ParkingConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_MAX_CONNECTIONS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
