//! Marketplace - serves and queries plugin catalogs
//!
//! Main entry point: the HTTP server plus offline query and validation tools

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marketplace_core::api::{self, AppState};
use marketplace_core::{
    Catalog, CatalogConfig, MergedCatalog, ProxyCatalog, ServerConfig, ServiceInfo,
    StaticCatalog,
};

mod query_cli;

use query_cli::{LabelsCommand, QueryCommand};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "marketplace",
    about = "Plugin marketplace catalog server and tools",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[clap(long, global = true)]
    json_logs: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Serve the marketplace HTTP API
    Server {
        /// Configuration file (defaults to <config dir>/marketplace/config.yaml)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Registry snapshot to serve
        #[clap(long)]
        database: Option<PathBuf>,

        /// Address to listen on, e.g. 127.0.0.1:8085
        #[clap(long)]
        listen: Option<String>,

        /// Upstream marketplace to merge after the local registry (repeatable)
        #[clap(long = "upstream")]
        upstreams: Vec<String>,
    },

    /// Run a single catalog query and print the results
    Query(QueryCommand),

    /// Load and validate a registry snapshot
    Validate {
        /// Registry snapshot to validate
        #[clap(long, default_value = "plugins.json")]
        database: PathBuf,

        /// Configuration file (defaults to <config dir>/marketplace/config.yaml)
        #[clap(long)]
        config: Option<PathBuf>,
    },

    /// Print the label catalogue
    Labels(LabelsCommand),
}

/// Initialize tracing subscriber
///
/// Logs always go to stderr so stdout stays clean for query output.
fn initialize_tracing(log_level: &LogLevel, json_logs: bool) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Server {
            config,
            database,
            listen,
            upstreams,
        } => server_command(config, database, listen, upstreams).await,
        Command::Query(command) => command.execute().await,
        Command::Validate { database, config } => validate_command(&database, config),
        Command::Labels(command) => command.execute(),
    }
}

/// Build the catalog served for a registry snapshot plus upstream marketplaces
///
/// The local snapshot comes first so upstreams win exact version ties.
pub(crate) fn build_catalog(
    database: &Path,
    upstreams: &[String],
    upstream_timeout: Duration,
    config: &CatalogConfig,
) -> Result<Arc<dyn Catalog>> {
    let local = StaticCatalog::from_path(database, config)
        .with_context(|| format!("Failed to load registry {}", database.display()))?;
    info!(
        "Loaded {} plugins ({} versions) from {}",
        local.plugin_count(),
        local.version_count(),
        database.display()
    );

    let mut sources: Vec<Arc<dyn Catalog>> = vec![Arc::new(local)];
    for upstream in upstreams {
        let proxy = ProxyCatalog::new(upstream, upstream_timeout)
            .with_context(|| format!("Failed to configure upstream {upstream}"))?;
        info!("Merging upstream marketplace {}", proxy.base_url());
        sources.push(Arc::new(proxy));
    }

    let merged = MergedCatalog::new(sources, config.clone())
        .context("Invalid catalog configuration")?;
    Ok(Arc::new(merged))
}

/// Load the config file named on the command line, or the default one
pub(crate) fn load_config(config_path: Option<PathBuf>) -> Result<ServerConfig> {
    match config_path {
        Some(path) => ServerConfig::load_from_path(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => ServerConfig::load().context("Failed to load config"),
    }
}

async fn server_command(
    config_path: Option<PathBuf>,
    database: Option<PathBuf>,
    listen: Option<String>,
    upstreams: Vec<String>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(database) = database {
        config.database = database;
    }
    if let Some(listen) = listen {
        config.listen = listen;
    }
    if !upstreams.is_empty() {
        config.upstreams = upstreams;
    }
    config.validate().context("Invalid configuration")?;

    let catalog = build_catalog(
        &config.database,
        &config.upstreams,
        config.upstream_timeout(),
        &config.catalog,
    )?;

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    let state = AppState::new(catalog, ServiceInfo::default());
    api::serve(listener, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Marketplace stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

fn validate_command(database: &Path, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = StaticCatalog::from_path(database, &config.catalog)
        .with_context(|| format!("Registry {} is invalid", database.display()))?;

    println!(
        "{}: {} plugins, {} versions",
        database.display(),
        catalog.plugin_count(),
        catalog.version_count()
    );
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_server_flags() {
        let cli = Cli::parse_from([
            "marketplace",
            "server",
            "--database",
            "/tmp/plugins.json",
            "--upstream",
            "https://a.example.com",
            "--upstream",
            "https://b.example.com",
        ]);

        match cli.command {
            Command::Server {
                database,
                upstreams,
                listen,
                config,
            } => {
                assert_eq!(database, Some(PathBuf::from("/tmp/plugins.json")));
                assert_eq!(upstreams, vec!["https://a.example.com", "https://b.example.com"]);
                assert!(listen.is_none());
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["marketplace", "labels", "--log-level", "debug", "--json-logs"]);
        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert!(cli.json_logs);
    }

    #[test]
    fn test_validate_defaults_database() {
        let cli = Cli::parse_from(["marketplace", "validate"]);
        match cli.command {
            Command::Validate { database, config } => {
                assert_eq!(database, PathBuf::from("plugins.json"));
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_build_catalog_rejects_invalid_registry() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("plugins.json");
        std::fs::write(&path, r#"[{"manifest": {"id": "demo"}}]"#).unwrap();

        let err = build_catalog(&path, &[], Duration::from_secs(1), &CatalogConfig::default())
            .err()
            .expect("invalid registry is rejected");
        assert!(format!("{err:#}").contains("demo"));
    }
}
