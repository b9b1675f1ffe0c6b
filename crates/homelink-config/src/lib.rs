//! Connector configuration.
//!
//! One [`ConnectorConfig`] value is constructed at startup and injected
//! into the credential store and the sync engine. Nothing reads ambient
//! process state after that; environment variables are consulted only
//! here, as overrides on top of the config file.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Process-wide connector identity and endpoints.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    /// Client identity presented on every outbound callback.
    pub client_id: String,

    /// Client secret paired with `client_id`. Redacted from Debug output.
    pub client_secret: String,

    /// Logical table name of the backing keyed store.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Endpoint of the live push transport.
    #[serde(default)]
    pub live_endpoint: Option<String>,
}

fn default_table_name() -> String {
    "homelink".to_string()
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("table_name", &self.table_name)
            .field("live_endpoint", &self.live_endpoint)
            .finish()
    }
}

impl ConnectorConfig {
    /// Builds a config directly; used by tests and embedders.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            table_name: default_table_name(),
            live_endpoint: None,
        }
    }

    /// Loads configuration from a TOML file, then applies environment
    /// overrides (`HOMELINK_CLIENT_ID`, `HOMELINK_CLIENT_SECRET`,
    /// `HOMELINK_TABLE_NAME`, `HOMELINK_LIVE_ENDPOINT`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(client_id = config.client_id, table = config.table_name, "configuration loaded");
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("HOMELINK_CLIENT_ID") {
            self.client_id = value;
        }
        if let Ok(value) = std::env::var("HOMELINK_CLIENT_SECRET") {
            self.client_secret = value;
        }
        if let Ok(value) = std::env::var("HOMELINK_TABLE_NAME") {
            self.table_name = value;
        }
        if let Ok(value) = std::env::var("HOMELINK_LIVE_ENDPOINT") {
            self.live_endpoint = Some(value);
        }
    }

    /// Rejects configurations with an empty client identity.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(ConfigError::validation("client_id must not be empty"));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::validation("client_secret must not be empty"));
        }
        if self.table_name.is_empty() {
            return Err(ConfigError::validation("table_name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "client_id = \"cid\"\nclient_secret = \"shh\"\nlive_endpoint = \"wss://live.example\""
        )
        .unwrap();

        let config = ConnectorConfig::load(file.path()).unwrap();
        assert_eq!(config.client_id, "cid");
        assert_eq!(config.table_name, "homelink");
        assert_eq!(config.live_endpoint.as_deref(), Some("wss://live.example"));
    }

    #[test]
    fn test_validation_rejects_empty_identity() {
        let config = ConnectorConfig::new("", "secret");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ConnectorConfig::new("cid", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = toml::from_str::<ConnectorConfig>(
            "client_id = \"cid\"\nclient_secret = \"s\"\nsurprise = 1",
        )
        .unwrap_err();
        assert!(err.to_string().contains("surprise"));
    }
}
