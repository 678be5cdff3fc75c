//! Connection settings for a backend client.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DataAccessError, DataAccessResult};

pub const ENDPOINT_ENV: &str = "COSMOS_ENDPOINT";
pub const DATABASE_NAME_ENV: &str = "COSMOS_DATABASE_NAME";
pub const PRIMARY_KEY_ENV: &str = "COSMOS_KEY";

/// Endpoint, database and credential used to connect a backend.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    #[serde(default)]
    pub endpoint_uri: String,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub primary_key: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint_uri", &self.endpoint_uri)
            .field("database_name", &self.database_name)
            .field("primary_key", &"<redacted>")
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(
        endpoint_uri: impl Into<String>,
        database_name: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_uri: endpoint_uri.into(),
            database_name: database_name.into(),
            primary_key: primary_key.into(),
        }
    }

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().or_lookup(|name| std::env::var(name).ok())
    }

    /// Fills every empty setting from the environment, keeping explicit values.
    #[must_use]
    pub fn or_env(self) -> Self {
        self.or_lookup(|name| std::env::var(name).ok())
    }

    /// Fills every empty setting from `lookup`, keyed by environment variable name.
    #[must_use]
    pub fn or_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (value, name) in [
            (&mut self.endpoint_uri, ENDPOINT_ENV),
            (&mut self.database_name, DATABASE_NAME_ENV),
            (&mut self.primary_key, PRIMARY_KEY_ENV),
        ] {
            if value.is_empty() {
                if let Some(found) = lookup(name) {
                    *value = found;
                }
            }
        }

        self
    }

    /// Fails with a configuration error naming the first missing setting.
    pub fn validate(&self) -> DataAccessResult<()> {
        for (value, name) in [
            (&self.endpoint_uri, ENDPOINT_ENV),
            (&self.database_name, DATABASE_NAME_ENV),
            (&self.primary_key, PRIMARY_KEY_ENV),
        ] {
            if value.trim().is_empty() {
                return Err(DataAccessError::Configuration(format!(
                    "connection setting {name} is not configured"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            ENDPOINT_ENV => Some("https://env.example:8081".into()),
            DATABASE_NAME_ENV => Some("envdb".into()),
            _ => None,
        }
    }

    #[test]
    fn test_should_prefer_explicit_values_over_environment() {
        let config = ConnectionConfig::new("https://explicit:8081", "", "").or_lookup(lookup);
        assert_eq!(config.endpoint_uri, "https://explicit:8081");
        assert_eq!(config.database_name, "envdb");
        assert_eq!(config.primary_key, "");
    }

    #[test]
    fn test_should_report_missing_setting() {
        let config = ConnectionConfig::default().or_lookup(lookup);
        match config.validate() {
            Err(DataAccessError::Configuration(message)) => assert!(message.contains(PRIMARY_KEY_ENV)),
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[test]
    fn test_should_redact_primary_key_in_debug_output() {
        let config = ConnectionConfig::new("https://a", "db", "secret");
        assert!(config.validate().is_ok());
        assert!(!format!("{config:?}").contains("secret"));
    }
}
