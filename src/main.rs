//! Market Cache - namespaced caching service
//!
//! Serves the named cache instances over an admin HTTP API, backed by Redis
//! when `REDIS_URL` is set and by the in-process store otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_cache::{
    api::create_router, spawn_cleanup_task, AppState, Config, FallbackStore, MemoryStore,
    RedisStore, SharedStore,
};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis, or fall back to the in-memory store
/// 4. Start background expiry sweep for the in-memory store
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Market Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: namespace={}, default_ttl={}s, port={}, cleanup_interval={}s",
        config.default_namespace, config.default_ttl, config.server_port, config.cleanup_interval
    );

    let memory = Arc::new(MemoryStore::new());
    let store = select_store(&config, memory.clone()).await;
    info!("Cache backend initialized: {}", store.name());

    let cleanup_handle = spawn_cleanup_task(memory, config.cleanup_interval);
    info!("Background expiry sweep started");

    let app = create_router(AppState::from_config(store, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Picks the backing store for the process.
///
/// With `REDIS_URL` set, Redis is primary and `memory` serves whenever a
/// Redis call fails. A failed initial connection degrades to memory only.
async fn select_store(config: &Config, memory: Arc<MemoryStore>) -> SharedStore {
    let Some(url) = config.redis_url.as_deref() else {
        info!("REDIS_URL not set, using in-memory store");
        return memory;
    };

    match RedisStore::connect(url).await {
        Ok(redis) => {
            info!("Connected to Redis");
            let store: SharedStore = Arc::new(FallbackStore::new(Arc::new(redis), memory));
            store
        }
        Err(e) => {
            warn!("Redis connection failed, using in-memory store: {}", e);
            memory
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Expiry sweep aborted");
}
