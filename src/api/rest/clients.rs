use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::rest::auth::CurrentAdmin;
use crate::error::AppError;
use crate::models::client::{Client, NewClient};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", get(list_clients).post(register_client))
        .route("/clients/:id", get(get_client))
}

async fn list_clients(State(state): State<Arc<AppState>>, _admin: CurrentAdmin) -> Json<Vec<Client>> {
    Json(state.clients.list_clients())
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(state.clients.get_client(&id)?))
}

async fn register_client(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Json(payload): Json<NewClient>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(state.clients.register_client(payload)?))
}
