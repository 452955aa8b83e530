use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::blog::BlogPostInput;
use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{BlogFilter, BlogPostPatch};
use crate::domain::entities::{BlogCommentRecord, BlogPostRecord};
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub tag: Option<String>,
    pub published: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<BlogPostRecord>>, ApiError> {
    let filter = BlogFilter {
        tag: query.tag,
        published: query.published,
    };
    let page = PageRequest::new(query.page, query.page_size);
    Ok(Json(state.blog.list(&filter, page).await?))
}

/// Read one post by slug; the view counter increments as a side effect.
pub async fn read(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPostRecord>, ApiError> {
    Ok(Json(state.blog.read_by_slug(&slug).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRequest>,
) -> Result<(StatusCode, Json<BlogPostRecord>), ApiError> {
    let record = state
        .blog
        .create(BlogPostInput {
            title: request.title,
            excerpt: request.excerpt,
            content: request.content,
            tags: request.tags,
            published: request.published,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// The allow-listed partial update body. Unknown keys fail deserialization
/// outright instead of being silently dropped.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<BlogPostRecord>, ApiError> {
    let patch = BlogPostPatch {
        title: request.title,
        slug: None,
        excerpt: request.excerpt,
        content: request.content,
        tags: request.tags,
        published: request.published,
        views: request.views,
        likes: request.likes,
    };
    Ok(Json(state.blog.patch(id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.blog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct LikeReply {
    pub likes: i64,
}

pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeReply>, ApiError> {
    let likes = state.blog.like(id).await?;
    Ok(Json(LikeReply { likes }))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<BlogCommentRecord>>, ApiError> {
    Ok(Json(state.blog.comments(&slug).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub author: String,
    pub body: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<BlogCommentRecord>), ApiError> {
    let record = state
        .blog
        .add_comment(&slug, request.author, request.body)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
