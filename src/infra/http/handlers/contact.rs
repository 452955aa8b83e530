use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::application::contact::ContactInput;
use crate::domain::entities::ContactMessageRecord;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactMessageRecord>), ApiError> {
    let record = state
        .contact
        .submit(ContactInput {
            name: request.name,
            email: request.email,
            subject: request.subject,
            body: request.message,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
