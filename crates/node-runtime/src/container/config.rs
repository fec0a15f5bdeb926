//! # Node Configuration
//!
//! Sources, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. TOML file (`--config`)
//! 3. environment (`LEDGER_HTTP_PORT`, `LEDGER_STORAGE`, `LEDGER_DB_PATH`, `LEDGER_SEED`)
//! 4. command-line flags

use ledger_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP gateway configuration.
    pub gateway: GatewayConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Which store backs the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit.
    #[default]
    Memory,
    /// SQLite database file at `storage.path`.
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(ConfigError::Invalid(format!("unknown storage backend {other:?}"))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file for the SQLite backend.
    pub path: PathBuf,
    /// Load the demo dataset into an empty store on startup.
    pub seed: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/ledger.db"),
            seed: true,
        }
    }
}

impl NodeConfig {
    /// Parse a TOML document; missing sections keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment variables. Unparsable values are
    /// logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("LEDGER_HTTP_PORT") {
            match port.parse() {
                Ok(p) => self.gateway.http.port = p,
                Err(_) => warn!(value = %port, "LEDGER_HTTP_PORT is not a port number"),
            }
        }

        if let Some(backend) = lookup("LEDGER_STORAGE") {
            match backend.parse() {
                Ok(b) => self.storage.backend = b,
                Err(e) => warn!(error = %e, "Ignoring LEDGER_STORAGE"),
            }
        }

        if let Some(path) = lookup("LEDGER_DB_PATH") {
            self.storage.path = PathBuf::from(path);
        }

        if let Some(seed) = lookup("LEDGER_SEED") {
            self.storage.seed = seed.to_lowercase() == "true" || seed == "1";
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "storage.path is required for the sqlite backend".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Read(String),

    #[error("cannot parse configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.seed);
        assert_eq!(config.gateway.http.port, 3001);
    }

    #[test]
    fn test_toml_sections() {
        let config = NodeConfig::from_toml_str(
            r#"
            [gateway.http]
            host = "127.0.0.1"
            port = 4000

            [gateway.reporting]
            default_limit = 5

            [storage]
            backend = "sqlite"
            path = "/tmp/ledger.db"
            seed = false
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.http.port, 4000);
        assert_eq!(config.gateway.reporting.default_limit, 5);
        assert_eq!(config.gateway.timeouts.request_secs, 30);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/ledger.db"));
        assert!(!config.storage.seed);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            NodeConfig::from_toml_str("[storage]\nbackend = \"postgres\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LEDGER_HTTP_PORT", "8081"),
            ("LEDGER_STORAGE", "SQLite"),
            ("LEDGER_DB_PATH", "/var/lib/ledger.db"),
            ("LEDGER_SEED", "0"),
        ]
        .into_iter()
        .collect();

        let mut config = NodeConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.gateway.http.port, 8081);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path, PathBuf::from("/var/lib/ledger.db"));
        assert!(!config.storage.seed);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = NodeConfig::default();
        config.apply_env(|key| match key {
            "LEDGER_HTTP_PORT" => Some("http".to_string()),
            "LEDGER_STORAGE" => Some("postgres".to_string()),
            _ => None,
        });
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_zero_port_is_invalid() {
        let mut config = NodeConfig::default();
        config.gateway.http.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
