pub mod admins;
pub mod auth;
pub mod clients;
pub mod deliveries;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::Partition;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(deliveries::router())
        .merge(admins::router())
        .merge(clients::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct PartitionCounts {
    pending: usize,
    accepted: usize,
    completed: usize,
    rejected: usize,
    rescheduled: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    deliveries: PartitionCounts,
    admins: usize,
    clients: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let lifecycle = &state.lifecycle;

    Ok(Json(HealthResponse {
        status: "ok",
        deliveries: PartitionCounts {
            pending: lifecycle.count(Partition::Pending).await?,
            accepted: lifecycle.count(Partition::Accepted).await?,
            completed: lifecycle.count(Partition::Completed).await?,
            rejected: lifecycle.count(Partition::Rejected).await?,
            rescheduled: lifecycle.count(Partition::Rescheduled).await?,
        },
        admins: state.admins.len(),
        clients: state.clients.len(),
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
