//! Snippetbox server.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_sessions::MemoryStore;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use snippetbox_kernel::session::redis_store;
use snippetbox_kernel::{AppState, Config, SessionConfig, app};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Snippetbox");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(addr = %config.addr, "Configuration loaded");

    let state = AppState::from_config(&config)
        .await
        .context("failed to initialize application state")?;

    let session_config = SessionConfig::from(&config);
    let router: Router = match &config.redis_url {
        Some(url) => {
            let store = redis_store(url).await?;
            info!("Sessions stored in Redis");
            app(state, store, &session_config).context("failed to build router")?
        }
        None => {
            warn!("REDIS_URL not set, sessions are kept in memory");
            app(state, MemoryStore::default(), &session_config)
                .context("failed to build router")?
        }
    };

    let router = router.layer(TimeoutLayer::new(config.request_timeout));

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.addr))?;

    info!(addr = %config.addr, "Server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,snippetbox_kernel=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
