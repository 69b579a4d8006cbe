//! Server configuration loaded from TOML with environment overrides.
//!
//! ## Loading Order
//!
//! 1. `SENTRA_CONFIG` environment variable (path to a TOML file)
//! 2. `sentra.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Individual fields can then be overridden via environment variables
//! (`SENTRA_ADDR`, `SENTRA_DATA_DIR`, `SENTRA_INSIGHT_API_KEY`,
//! `SENTRA_AUTH_TOKENS`).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default TOML file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "sentra.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub insight: InsightConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory of the report database.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightConfig {
    /// Upstream text-generation endpoint.
    pub endpoint: String,
    /// Upstream API key; insights are disabled while unset.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Bearer tokens accepted as live sessions. Empty locks the
    /// dashboard routes until tokens are configured.
    pub tokens: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/sentra.db"),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent"
                .to_string(),
            api_key: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { tokens: Vec::new() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            insight: InsightConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration following the documented order.
    pub fn load() -> Self {
        let mut config = if let Ok(path) = std::env::var("SENTRA_CONFIG") {
            Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "could not load config file; using defaults");
                Self::default()
            })
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(Path::new(DEFAULT_CONFIG_FILE)).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not load sentra.toml; using defaults");
                Self::default()
            })
        } else {
            Self::default()
        };

        config.apply_env();
        config
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("SENTRA_ADDR") {
            self.server.addr = addr;
        }
        if let Ok(dir) = std::env::var("SENTRA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("SENTRA_INSIGHT_API_KEY") {
            self.insight.api_key = Some(key);
        }
        if let Ok(tokens) = std::env::var("SENTRA_AUTH_TOKENS") {
            self.auth.tokens = tokens
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert!(config.insight.api_key.is_none());
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            addr = "127.0.0.1:9000"

            [auth]
            tokens = ["ops-1", "ops-2"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.auth.tokens.len(), 2);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data/sentra.db"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<Config, _> = toml::from_str("[server]\nadress = \"oops\"\n");
        assert!(parsed.is_err());
    }
}
