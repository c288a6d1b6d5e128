use std::sync::Arc;

use anyhow::Context;
use assistant_auth::auth::AuthService;
use assistant_auth::config::{AppConfig, DEFAULT_CONFIG_PATH};
use assistant_auth::database::{schema, DatabaseManager, PgUserDirectory};
use assistant_auth::{app, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, REDIS_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;

    logging::init(&config.logging.filter);
    tracing::info!("Starting assistant-auth in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    schema::ensure_schema(database.pool())
        .await
        .context("failed to prepare database schema")?;

    let auth = AuthService::init(&config)
        .await
        .context("failed to initialize token store")?;

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, auth, Arc::new(PgUserDirectory::new(database.pool().clone())));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shutting down");
    state.auth.close().await;
    database.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
