use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::identity::{IdentityProvider, Session};
use crate::models::admin::{Admin, AdminContext, ProfileUpdate};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
        .route("/auth/profile", patch(update_profile))
        .route("/auth/password", patch(update_password))
}

/// The admin behind the request's bearer token.
pub struct CurrentAdmin {
    pub context: AdminContext,
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .ok_or(AppError::Unauthorized)?;

        let context = state.admins.authenticate(&token).await?;
        Ok(Self { context, token })
    }
}

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<Session>, AppError> {
    let result = state
        .admins
        .identity()
        .sign_in(&payload.email, &payload.password)
        .await;

    let outcome = if result.is_ok() { "success" } else { "failure" };
    state
        .metrics
        .sign_ins_total
        .with_label_values(&[outcome])
        .inc();

    if result.is_err() {
        warn!("sign-in rejected");
    }

    Ok(Json(result?))
}

async fn sign_out(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
) -> Result<StatusCode, AppError> {
    state.admins.identity().sign_out(&admin.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
) -> Result<Json<Admin>, AppError> {
    Ok(Json(state.admins.current_admin(&admin.context)?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Admin>, AppError> {
    let updated = state
        .admins
        .update_profile(&admin.context, payload)
        .await?;
    Ok(Json(updated))
}

async fn update_password(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<StatusCode, AppError> {
    state
        .admins
        .update_password(
            &admin.context,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
