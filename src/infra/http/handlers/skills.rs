use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::skills::SkillInput;
use crate::domain::entities::SkillRecord;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

use super::forms::MultipartForm;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SkillRecord>>, ApiError> {
    Ok(Json(state.skills.list(query.category.as_deref()).await?))
}

fn input_from_form(form: &MultipartForm) -> Result<SkillInput, ApiError> {
    Ok(SkillInput {
        name: form.required("name")?,
        category: form.required("category")?,
        proficiency: form.int("proficiency")?,
    })
}

pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SkillRecord>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = input_from_form(&form)?;
    let image = form.take_image();

    let record = state.skills.create(input, image).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SkillRecord>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = input_from_form(&form)?;
    let change = form.image_change();

    Ok(Json(state.skills.update(id, input, change).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.skills.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
