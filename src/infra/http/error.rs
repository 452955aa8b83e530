//! The one JSON error shape every endpoint speaks.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::analytics::AnalyticsError;
use crate::application::auth::AuthError;
use crate::application::blog::BlogError;
use crate::application::chatbot::ChatError;
use crate::application::contact::ContactError;
use crate::application::journey::JourneyError;
use crate::application::media::MediaError;
use crate::application::projects::ProjectError;
use crate::application::repos::RepoError;
use crate::application::skills::SkillError;
use crate::application::stats::StatsError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// An HTTP-ready error: public status and message, optional public detail.
/// Internal diagnostics go to the log at the mapping site, not the wire.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Administrator access required")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            error: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

fn from_domain(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { .. } => ApiError::not_found(err.to_string()),
        DomainError::InvalidField { .. } | DomainError::Validation { .. } => {
            ApiError::bad_request(err.to_string())
        }
    }
}

fn from_repo(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::Duplicate { constraint } => {
            ApiError::new(StatusCode::CONFLICT, "Duplicate record").with_detail(constraint)
        }
        RepoError::Timeout => {
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database timeout")
        }
        RepoError::Persistence(detail) => {
            tracing::error!(detail = %detail, "persistence failure");
            ApiError::internal()
        }
    }
}

fn from_media(err: MediaError) -> ApiError {
    match err {
        MediaError::Validation(detail) => ApiError::bad_request(detail.to_string()),
        MediaError::Store(detail) => {
            tracing::error!(error = %detail, "media store failure");
            ApiError::internal()
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::InvalidToken => ApiError::unauthorized("Missing or invalid bearer token"),
            AuthError::Expired => ApiError::unauthorized("Token expired"),
            AuthError::Repo(repo) => from_repo(repo),
            AuthError::Internal(detail) => {
                tracing::error!(detail = %detail, "auth failure");
                ApiError::internal()
            }
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::NotFound => ApiError::not_found("Project not found"),
            ProjectError::Domain(domain) => from_domain(domain),
            ProjectError::Media(media) => from_media(media),
            ProjectError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<SkillError> for ApiError {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::NotFound => ApiError::not_found("Skill not found"),
            SkillError::Domain(domain) => from_domain(domain),
            SkillError::Media(media) => from_media(media),
            SkillError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<BlogError> for ApiError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::NotFound => ApiError::not_found("Post not found"),
            BlogError::Domain(domain) => from_domain(domain),
            BlogError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<JourneyError> for ApiError {
    fn from(err: JourneyError) -> Self {
        match err {
            JourneyError::NotFound => ApiError::not_found("Journey item not found"),
            JourneyError::Domain(domain) => from_domain(domain),
            JourneyError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Domain(domain) => from_domain(domain),
            ContactError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Domain(domain) => from_domain(domain),
            ChatError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Domain(domain) => from_domain(domain),
            AnalyticsError::Repo(repo) => from_repo(repo),
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::NoData { reason } => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Statistics temporarily unavailable",
            )
            .with_detail(format!("{reason}; retry shortly")),
            StatsError::Repo(repo) => from_repo(repo),
        }
    }
}
