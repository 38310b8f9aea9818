// Configuration source loading
//
// Loads configuration from multiple sources with priority:
// 1. Environment variables (highest)
// 2. Config file from CATALOGD_CONFIG path
// 3. Inline config from CATALOGD_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.catalogd.toml)
// 5. Built-in defaults (lowest)

use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const ENV_PREFIX: &str = "CATALOGD_";

/// Loads configuration from all sources.
pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    if let Some(file_config) = load_from_file()? {
        merge_config(&mut config, file_config);
    }

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from an explicit file path, then applies env
/// overrides on top (env vars still win — they're the `--config` flag's
/// escape hatch for one-off overrides in CI).
pub fn load_from_explicit_path(path: &Path) -> Result<RuntimeConfig> {
    let mut config = read_toml_file(path)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

fn read_toml_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Loads configuration from file, checking (in order) the explicit path
/// env var, the inline-content env var, then two default locations.
fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("CATALOGD_CONFIG") {
        return Ok(Some(read_toml_file(Path::new(&path))?));
    }

    if let Ok(content) = env::var("CATALOGD_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("failed to parse inline config from CATALOGD_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./config.toml", "./.catalogd.toml"] {
        if Path::new(path).exists() {
            return Ok(Some(read_toml_file(Path::new(path))?));
        }
    }

    Ok(None)
}

/// Merges a file-based config into the defaults. Each top-level section
/// present in the file replaces the corresponding default wholesale.
fn merge_config(base: &mut RuntimeConfig, file: RuntimeConfig) {
    base.store = file.store;
    base.server = file.server;
}

/// Applies environment variable overrides (highest priority).
fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<()> {
    if let Some(val) = get_env_string("STORE_ROOT_DIR")? {
        config.store.root_dir = val;
    }
    if let Some(val) = get_env_string("STORE_URL_PREFIX")? {
        config.store.url_prefix = val;
    }
    if let Some(val) = get_env_string("STORE_BASE_URL")? {
        config.store.base_url = val;
    }

    if let Some(val) = get_env_string("LISTEN_ADDR")? {
        config.server.listen_addr = val;
    }
    if let Some(val) = get_env_string("LOG_LEVEL")? {
        config.server.log_level = val;
    }
    if let Some(val) = get_env_string("LOG_FORMAT")? {
        config.server.log_format = match val.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }
    if let Some(val) = get_env_usize("GZIP_THRESHOLD_BYTES")? {
        config.server.gzip_threshold_bytes = val;
    }

    Ok(())
}

fn get_env_string(key: &str) -> Result<Option<String>> {
    let full_key = format!("{}{}", ENV_PREFIX, key);
    match env::var(&full_key) {
        Ok(val) if !val.is_empty() => Ok(Some(val)),
        Ok(_) => Ok(None),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read env var {}", full_key)),
    }
}

fn get_env_usize(key: &str) -> Result<Option<usize>> {
    let full_key = format!("{}{}", ENV_PREFIX, key);
    match get_env_string(key)? {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .with_context(|| format!("{} must be a valid number", full_key))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
