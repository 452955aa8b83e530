use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::application::stats::StatsReply;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub username: Option<String>,
}

pub async fn github(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsReply>, ApiError> {
    let username = query
        .username
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(&*state.stats_username);
    Ok(Json(state.stats.current(username).await?))
}
