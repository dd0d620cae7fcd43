//! cmmc-at (Assessment Tracker) - CMMC self-assessment service
//!
//! Loads the Level 1 and Level 2 practice catalogs, restores the persisted
//! assessment, and serves the JSON API on port 5741 by default.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use cmmc_common::cache::{MemoryResponseCache, ResponseCache};
use cmmc_common::catalog::CatalogLoader;
use cmmc_common::config::{
    load_module_config, LoggingConfig, RootFolderInitializer, RootFolderResolver, DEFAULT_PORT,
};
use cmmc_common::persistence::{KeyValueStore, LoadOutcome, MemoryStore, PersistenceAdapter, SqliteStore};
use cmmc_common::AssessmentEngine;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cmmc_at::{build_router, AppState};

const MODULE_NAME: &str = "cmmc-at";

/// Command-line arguments for cmmc-at
#[derive(Parser, Debug)]
#[command(name = "cmmc-at")]
#[command(about = "CMMC assessment tracker service")]
#[command(version)]
struct Args {
    /// Root folder holding cmmc.db and the bundled catalogs
    #[arg(short, long, env = "CMMC_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CMMC_AT_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "CMMC_AT_BIND")]
    bind: Option<String>,

    /// Level 1 catalog URL or file path
    #[arg(long, env = "CMMC_LEVEL1_URL")]
    level1_url: Option<String>,

    /// Level 2 catalog URL or file path
    #[arg(long, env = "CMMC_LEVEL2_URL")]
    level2_url: Option<String>,

    /// Keep assessment state in memory only
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_module_config(MODULE_NAME);
    init_tracing(&toml_config.logging);

    // Build identification first, before any network or database delay
    info!(
        "Starting CMMC Assessment Tracker (cmmc-at) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    // Catalogs: CLI/env override the TOML, unset entries use the bundled files
    let mut catalog_config = toml_config.catalog.clone().unwrap_or_default();
    if args.level1_url.is_some() {
        catalog_config.level1_url = args.level1_url.clone();
    }
    if args.level2_url.is_some() {
        catalog_config.level2_url = args.level2_url.clone();
    }
    let sources = catalog_config.resolve(initializer.root_folder());

    // No retry: a missing catalog is fatal
    let catalogs = CatalogLoader::new()?
        .load(&sources)
        .await
        .context("Practice catalogs could not be loaded")?;

    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        warn!("Ephemeral mode: assessment state will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let db_path = initializer.database_path();
        info!("Database: {}", db_path.display());
        Arc::new(SqliteStore::open(&db_path).await?)
    };

    let (persisted, outcome) = PersistenceAdapter::new(store.clone()).load().await;
    match outcome {
        LoadOutcome::Restored => info!("✓ Assessment state restored"),
        LoadOutcome::Empty => info!("No saved assessment; starting fresh"),
        LoadOutcome::Discarded => warn!("Saved assessment was unusable and has been discarded"),
    }

    let engine = AssessmentEngine::new(catalogs, persisted);
    let cache: Arc<dyn ResponseCache> = Arc::new(MemoryResponseCache::new());
    let state = AppState::new(engine, store, cache);

    // Records created for new catalog practices are written immediately
    {
        let engine = state.engine.read().await;
        state.persist(&engine).await;
    }

    let app = build_router(state);

    let bind = args
        .bind
        .or(toml_config.bind_address)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("cmmc-at listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins over the configured level; a log file replaces stderr
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = &logging.file else {
        builder.init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            builder.init();
            warn!("Could not open log file {}: {}; logging to stderr", path.display(), e);
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
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
