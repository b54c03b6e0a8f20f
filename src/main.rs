use std::sync::Arc;

use chrono::Duration;
use delivery_desk::api;
use delivery_desk::config::Config;
use delivery_desk::error::AppError;
use delivery_desk::state::AppState;
use delivery_desk::store::memory::InMemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store = Arc::new(InMemoryStore::connect(&config.store)?);
    tracing::info!(project_id = %store.project_id(), "document store ready");

    let app_state = AppState::with_local_identity(
        store,
        Duration::seconds(config.session_ttl_secs),
        config.event_buffer_size,
    );

    if let Some(super_admin) = &config.super_admin {
        app_state
            .admins
            .initialize_super_admin(&super_admin.seed())
            .await?;
    } else {
        tracing::warn!("no super admin configured; admin management is unavailable");
    }

    let app = api::rest::router(Arc::new(app_state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
