use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::repos::UpsertJourneyItemParams;
use crate::domain::entities::{JourneyItemRecord, JourneyKind};
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<JourneyItemRecord>>, ApiError> {
    Ok(Json(state.journey.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub title: String,
    pub organization: String,
    pub kind: JourneyKind,
    pub period: String,
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<ItemRequest> for UpsertJourneyItemParams {
    fn from(request: ItemRequest) -> Self {
        Self {
            title: request.title,
            organization: request.organization,
            kind: request.kind,
            period: request.period,
            description: request.description,
            sort_order: request.sort_order,
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<ItemRequest>,
) -> Result<(StatusCode, Json<JourneyItemRecord>), ApiError> {
    let record = state.journey.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ItemRequest>,
) -> Result<Json<JourneyItemRecord>, ApiError> {
    Ok(Json(state.journey.update(id, request.into()).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.journey.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
