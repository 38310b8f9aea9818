use anyhow::{Context, Result};
use catalog_config::RuntimeConfig;
use clap::Parser;
use std::path::PathBuf;

/// Catalog storage and query engine HTTP daemon
#[derive(Parser)]
#[command(name = "catalogd")]
#[command(version)]
#[command(about = "Serves declarative catalog data over HTTP", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config file and CATALOGD_LISTEN_ADDR)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Directory holding catalog blob/index files (overrides config file)
    #[arg(short = 'd', long, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("failed to load configuration")?
    };

    apply_cli_overrides(&mut config, &cli);
    config.validate().context("invalid configuration")?;

    catalog_server::init_tracing(&config);

    catalog_server::run(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        let host = config
            .server
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.listen_addr = format!("{host}:{port}");
    }

    if let Some(store_dir) = &cli.store_dir {
        config.store.root_dir = store_dir.to_string_lossy().to_string();
    }

    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }
}
