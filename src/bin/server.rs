//! Net Explorer lab server - HTTP service that runs learner lab sessions.

use clap::Parser;
use netexplorer::auth::StaticTokenIdentity;
use netexplorer::config::{
    apply_env_overrides, load_config, load_config_from_path, validate_config, Config, LogConfig,
};
use netexplorer::gateway::{build_router, AppState};
use netexplorer::lab::{LabSessionManager, MemorySessionStore, ReportArchiver};
use netexplorer::sandbox::create_sandbox_client;
use netexplorer::storage::create_object_store;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often idle sessions are swept when no request touches the store
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

// ---- CLI ----

#[derive(Parser)]
#[command(name = "netexplorer-server", about = "Net Explorer lab session server")]
struct Args {
    /// Config file (TOML or JSON5); defaults to the user config directory
    #[arg(long, short, env = "NETEXPLORER_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides config
    #[arg(long)]
    bind: Option<String>,

    /// Port, overrides config
    #[arg(long, short)]
    port: Option<u16>,
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log.level.as_str().into());

    if log.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => {
            let mut config = load_config_from_path(path)?;
            apply_env_overrides(&mut config);
            config
        }
        None => load_config()?,
    };
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load(&args)?;
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.log);

    let validation = validate_config(&config);
    for issue in &validation.warnings {
        warn!("Config: {}", issue);
    }
    if !validation.valid {
        for issue in &validation.errors {
            error!("Config: {}", issue);
        }
        anyhow::bail!("Invalid configuration ({} errors)", validation.errors.len());
    }

    // Backends
    let sandbox = create_sandbox_client(&config.sandbox).await?;
    info!(runtime = sandbox.name(), image = %config.sandbox.image, "Sandbox runtime ready");

    let store = create_object_store(&config.storage).await?;
    info!(store = store.id(), "Report store ready");

    let (sessions, abandoned) = MemorySessionStore::new(&config.session);
    let manager = Arc::new(LabSessionManager::new(
        sandbox,
        ReportArchiver::new(store, config.storage.timeout),
        Arc::new(sessions.clone()),
        &config.lab,
    ));

    // Background cleanup
    let reaper = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.reap_abandoned(abandoned).await })
    };
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.run_pending_tasks().await;
        }
    });

    let state = AppState::new(manager.clone(), Arc::new(StaticTokenIdentity::new(&config.auth)))
        .with_secure_cookies(!config.server.is_loopback());
    let app = build_router(state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    info!("Net Explorer listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    let released = manager.release_all().await;
    info!(released, "Released running sandboxes");
    reaper.abort();

    Ok(())
}
