use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::application::auth::{LoginReply, Principal};
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginReply>, ApiError> {
    let reply = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(reply))
}

#[derive(Debug, Serialize)]
pub struct VerifyReply {
    pub email: String,
    pub role: String,
    pub is_admin: bool,
}

/// Echo the verified identity; the auth middleware has already done the work.
pub async fn verify(Extension(principal): Extension<Principal>) -> Json<VerifyReply> {
    Json(VerifyReply {
        email: principal.email,
        role: principal.role,
        is_admin: principal.is_admin,
    })
}
