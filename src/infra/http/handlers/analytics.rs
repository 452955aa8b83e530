use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::application::analytics::TrackInput;
use crate::application::repos::VisitorSummary;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub visitor_id: String,
    pub path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

pub async fn track(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .analytics
        .track(TrackInput {
            visitor_id: request.visitor_id,
            path: request.path,
            referrer: request.referrer,
            user_agent: request.user_agent,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<u32>,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<VisitorSummary>, ApiError> {
    Ok(Json(state.analytics.summary(query.days).await?))
}
