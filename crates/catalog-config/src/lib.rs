// catalog-config - Unified configuration for catalogd
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from CATALOGD_CONFIG env var
// 3. Config file contents from CATALOGD_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.catalogd.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod sources;
mod validation;

/// Top-level runtime configuration for the `catalogd` daemon.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where catalogs live on disk and how their HTTP surface is addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub root_dir: String,
    pub url_prefix: String,
    pub base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: "./catalogs".to_string(),
            url_prefix: "/catalogs".to_string(),
            base_url: "http://localhost:8080/catalogs".to_string(),
        }
    }
}

/// HTTP listener and logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
    #[serde(default = "default_gzip_threshold_bytes")]
    pub gzip_threshold_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            gzip_threshold_bytes: default_gzip_threshold_bytes(),
        }
    }
}

/// Responses smaller than this are never gzip-encoded regardless of
/// client preference — matches typical TCP MSS. A tunable, not a wire
/// contract.
fn default_gzip_threshold_bytes() -> usize {
    1400
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Loads configuration from all sources with priority: env vars, then
    /// an explicit config file, then built-in defaults.
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Loads configuration from a specific file path, ignoring the
    /// default-location search (used by the `--config` CLI flag).
    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        sources::load_from_explicit_path(path)
    }

    /// Validates the configuration, returning a descriptive error for the
    /// first problem found.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
