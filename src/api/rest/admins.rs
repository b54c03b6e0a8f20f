use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::rest::auth::CurrentAdmin;
use crate::error::AppError;
use crate::models::admin::{Admin, CreateAdminData};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/admins", get(list_admins).post(create_admin))
}

async fn list_admins(State(state): State<Arc<AppState>>, _admin: CurrentAdmin) -> Json<Vec<Admin>> {
    Json(state.admins.list_admins())
}

async fn create_admin(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Json(payload): Json<CreateAdminData>,
) -> Result<Json<Admin>, AppError> {
    let created = state.admins.create_admin(&admin.context, payload).await?;
    Ok(Json(created))
}
