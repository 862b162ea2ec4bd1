//! syncd API server entry point

use std::sync::Arc;

use anyhow::Context;
use syncd_api::config::StoreBackend;
use syncd_api::routes::create_router;
use syncd_api::store::memory::MemoryStore;
use syncd_api::store::redis::{RedisAccounts, RedisDevices, RedisModules};
use syncd_api::{AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present; real deployments set the environment directly
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let state = match config.store_backend {
        StoreBackend::Redis => {
            let conn = syncd_shared::redis::create_connection(&config.redis_url)
                .await
                .context("connecting to redis")?;

            if !syncd_shared::redis::verify_connection(&conn, config.redis_ping_timeout).await {
                anyhow::bail!("redis did not answer PING at {}", config.redis_url);
            }

            let accounts = Arc::new(RedisAccounts::new(conn.clone(), config.share_code_ttl));
            let devices = Arc::new(RedisDevices::new(conn.clone()));
            let modules = Arc::new(RedisModules::new(conn, config.module_ttl));

            AppState::new(config, accounts.clone(), devices, accounts, modules)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store backend, data will not survive a restart");
            let store = Arc::new(MemoryStore::new(config.share_code_ttl));

            AppState::new(
                config,
                store.clone(),
                store.clone(),
                store.clone(),
                store,
            )
        }
    };

    let bind_address = state.config.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;

    tracing::info!(address = %bind_address, "syncd API server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server shut down finished");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM so in-flight requests drain before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
