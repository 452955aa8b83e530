use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::projects::ProjectInput;
use crate::application::repos::ProjectFilter;
use crate::domain::entities::ProjectRecord;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

use super::forms::MultipartForm;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProjectRecord>>, ApiError> {
    let filter = ProjectFilter {
        category: query.category,
        featured: query.featured,
    };
    Ok(Json(state.projects.list(&filter).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectRecord>, ApiError> {
    Ok(Json(state.projects.get(id).await?))
}

fn input_from_form(form: &MultipartForm) -> Result<ProjectInput, ApiError> {
    Ok(ProjectInput {
        title: form.required("title")?,
        description: form.required("description")?,
        category: form.required("category")?,
        tech_stack: form.list("tech_stack"),
        github_url: form.optional("github_url"),
        live_url: form.optional("live_url"),
        featured: form.flag("featured"),
    })
}

pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = input_from_form(&form)?;
    let image = form.take_image();

    let record = state.projects.create(input, image).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ProjectRecord>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = input_from_form(&form)?;
    let change = form.image_change();

    Ok(Json(state.projects.update(id, input, change).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.projects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
