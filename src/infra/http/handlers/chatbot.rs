use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::ChatDailyCount;
use crate::domain::entities::ChatExchangeRecord;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatExchangeRecord>, ApiError> {
    let record = state.chat.chat(request.message, request.session_id).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Page<ChatExchangeRecord>>, ApiError> {
    let page = PageRequest::new(query.page, query.page_size);
    Ok(Json(state.chat.history(page).await?))
}

pub async fn daily(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChatDailyCount>>, ApiError> {
    Ok(Json(state.chat.daily().await?))
}
