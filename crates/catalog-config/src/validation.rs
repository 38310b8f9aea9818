// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_store_config(&config.store)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<()> {
    if config.root_dir.is_empty() {
        bail!("store.root_dir must not be empty");
    }

    if config.url_prefix.is_empty() || !config.url_prefix.starts_with('/') {
        bail!("store.url_prefix must be a non-empty path starting with '/'");
    }

    if config.url_prefix.len() > 1 && config.url_prefix.ends_with('/') {
        bail!("store.url_prefix must not have a trailing slash");
    }

    if config.base_url.is_empty() {
        bail!("store.base_url must not be empty");
    }

    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        warn!(
            base_url = %config.base_url,
            "store.base_url does not look like an absolute URL; clients will receive it verbatim"
        );
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    if config.log_level.is_empty() {
        bail!("server.log_level must not be empty");
    }

    if config.gzip_threshold_bytes == 0 {
        bail!("server.gzip_threshold_bytes must be greater than 0");
    }

    if config.gzip_threshold_bytes > 10 * 1024 * 1024 {
        warn!(
            gzip_threshold_bytes = config.gzip_threshold_bytes,
            "server.gzip_threshold_bytes is unusually large; most responses will never be compressed"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_root_dir() {
        let mut store = StoreConfig::default();
        store.root_dir = String::new();
        assert!(validate_store_config(&store).is_err());
    }

    #[test]
    fn rejects_prefix_without_leading_slash() {
        let mut store = StoreConfig::default();
        store.url_prefix = "catalogs".to_string();
        assert!(validate_store_config(&store).is_err());
    }

    #[test]
    fn rejects_trailing_slash_prefix() {
        let mut store = StoreConfig::default();
        store.url_prefix = "/catalogs/".to_string();
        assert!(validate_store_config(&store).is_err());
    }

    #[test]
    fn rejects_listen_addr_without_port() {
        let mut server = ServerConfig::default();
        server.listen_addr = "localhost".to_string();
        assert!(validate_server_config(&server).is_err());
    }

    #[test]
    fn rejects_zero_gzip_threshold() {
        let mut server = ServerConfig::default();
        server.gzip_threshold_bytes = 0;
        assert!(validate_server_config(&server).is_err());
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate_store_config(&StoreConfig::default()).is_ok());
        assert!(validate_server_config(&ServerConfig::default()).is_ok());
    }
}
