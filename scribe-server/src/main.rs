use anyhow::{Context, Result};
use clap::Parser;
use scribe_server::config::LoggingConfig;
use scribe_server::{
    AppState, EntityStore, MetricsRegistry, Scheduler, ServerConfig, UuidGenerator,
    WriteBehindCache, create_router, init_metrics, persistence, start_expirer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "scribe-server")]
#[command(about = "Scribe - entity service with a write-behind cache", long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides config, RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    info!("Starting Scribe Server v{}", env!("CARGO_PKG_VERSION"));

    // Persistent store and the cache in front of it
    let store = persistence::open_store(&config.storage).context("Failed to open entity store")?;
    let cache = Arc::new(WriteBehindCache::new(store));

    init_metrics();
    let metrics = MetricsRegistry::new();
    cache.register_metrics(&metrics)?;

    // Periodic tasks
    let scheduler = Scheduler::new();
    let flush_task = cache.start(&scheduler, config.flush_interval());
    let expire_task = start_expirer(&scheduler, config.expire_interval());

    let state = AppState {
        cache: Arc::clone(&cache),
        ids: Arc::new(UuidGenerator),
        metrics,
        default_user: config.api.default_user.clone(),
    };
    let app = create_router(state);

    let addr = config.server_addr();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the timers, then persist whatever is still pending
    expire_task.stop().await;
    flush_task.stop().await;
    scheduler.shutdown();

    let final_cache = Arc::clone(&cache);
    tokio::task::spawn_blocking(move || {
        final_cache.flush();
        final_cache.close()
    })
    .await??;

    info!("Scribe Server stopped");
    Ok(())
}
