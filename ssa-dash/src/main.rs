//! ssa-dash - SSA work-order dashboard
//!
//! Loads the newest portal export of pending SSAs and serves the dashboard
//! UI with its JSON, export and SSE endpoints.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use ssa_common::config::{
    default_config_path, ConfigOverrides, ConfigSource, DashboardConfig, LoggingConfig,
    TomlConfig,
};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ssa_dash::reload::{load_dataset, spawn_periodic_reload};
use ssa_dash::{build_router, AppState, Dataset};

/// Command-line arguments for ssa-dash
#[derive(Parser, Debug)]
#[command(name = "ssa-dash")]
#[command(about = "Dashboard for pending SSA work orders")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SSA_DASH_CONFIG")]
    config: Option<PathBuf>,

    /// Workbook to load instead of the newest export in the data directory
    #[arg(short = 'f', long)]
    data_file: Option<PathBuf>,

    /// Directory searched for portal exports
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to read configuration file")?;
    let overrides = ConfigOverrides {
        data_file: args.data_file,
        data_dir: args.data_dir,
        host: args.host,
        port: args.port,
        log_level: args.log_level,
    };
    let config = DashboardConfig::resolve(&overrides, toml).context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    // Build identification first, before any slow workbook parsing
    info!(
        "Starting SSA Dashboard (ssa-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match ConfigSource::of(config_path.as_deref()) {
        ConfigSource::File(path) => info!("Configuration: {}", path.display()),
        ConfigSource::Missing(path) => {
            warn!("Config file {} not found, using defaults", path.display())
        }
        ConfigSource::NoConfigDir => warn!("No config directory available, using defaults"),
    }
    info!("Data directory: {}", config.data_dir.display());

    let initial = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || load_dataset(&config))
            .await
            .context("Initial load task panicked")?
    };
    let dataset = match initial {
        Ok(dataset) => {
            info!(
                "✓ Loaded {} SSAs from {}",
                dataset.records.len(),
                dataset
                    .source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
            dataset
        }
        Err(e) => {
            warn!("No data loaded ({}); serving an empty dashboard until the next reload", e);
            Dataset::empty()
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(dataset, config);
    let reload_task = spawn_periodic_reload(state.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("ssa-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(task) = reload_task {
        task.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Stderr logging, or a log file when configured
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},tower_http=info", logging.level)))
        .context("Invalid log level")?;
    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
