use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::api::rest::auth::CurrentAdmin;
use crate::engine::lifecycle::TransitionOptions;
use crate::error::AppError;
use crate::models::delivery::{DeliveryStatus, NewDeliveryRequest, StoredDelivery};
use crate::state::AppState;
use crate::store::Partition;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(submit_delivery))
        .route("/deliveries/:id", get(locate_delivery))
        .route("/deliveries/:id/transition", post(transition_delivery))
        .route("/partitions/:partition", get(list_partition))
        .route("/bulk/transition", post(bulk_transition))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: DeliveryStatus,
    #[serde(flatten)]
    pub options: TransitionOptions,
}

#[derive(Deserialize)]
pub struct BulkTransitionRequest {
    pub ids: Vec<String>,
    pub status: DeliveryStatus,
    #[serde(flatten)]
    pub options: TransitionOptions,
}

#[derive(Serialize)]
pub struct LocatedDelivery {
    pub partition: Partition,
    pub delivery: StoredDelivery,
}

async fn submit_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDeliveryRequest>,
) -> Result<Json<StoredDelivery>, AppError> {
    Ok(Json(state.lifecycle.submit(payload).await?))
}

async fn list_partition(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(partition): Path<Partition>,
) -> Result<Json<Vec<StoredDelivery>>, AppError> {
    Ok(Json(state.lifecycle.list(partition).await?))
}

async fn locate_delivery(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> Result<Json<LocatedDelivery>, AppError> {
    let (record, partition) = state.lifecycle.locate(&id).await?;
    Ok(Json(LocatedDelivery {
        partition,
        delivery: StoredDelivery { id, record },
    }))
}

async fn transition_delivery(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<StoredDelivery>, AppError> {
    tracing::debug!(admin_id = %admin.context.admin_id, delivery_id = %id, "transition requested");
    let moved = state
        .lifecycle
        .transition(&id, payload.status, &payload.options)
        .await?;
    Ok(Json(moved))
}

async fn bulk_transition(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Json(payload): Json<BulkTransitionRequest>,
) -> Result<Json<Vec<StoredDelivery>>, AppError> {
    tracing::debug!(
        admin_id = %admin.context.admin_id,
        count = payload.ids.len(),
        "bulk transition requested"
    );
    let moved = state
        .lifecycle
        .bulk_transition(&payload.ids, payload.status, &payload.options)
        .await?;
    Ok(Json(moved))
}
