//! Project listings, with the media lifecycle wired into mutations.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::events::{AppEvent, EventBus};
use crate::application::media::{ImageChange, InboundImage, MediaError, MediaService};
use crate::application::repos::{
    CreateProjectParams, ProjectFilter, ProjectsRepo, RepoError, UpdateProjectParams,
};
use crate::domain::entities::ProjectRecord;
use crate::domain::error::{DomainError, require_nonempty};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tech_stack: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
}

impl ProjectInput {
    fn validate(&self) -> Result<(), DomainError> {
        require_nonempty("title", &self.title)?;
        require_nonempty("description", &self.description)?;
        require_nonempty("category", &self.category)?;
        Ok(())
    }
}

pub struct ProjectService {
    repo: Arc<dyn ProjectsRepo>,
    media: Arc<MediaService>,
    events: EventBus,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectsRepo>, media: Arc<MediaService>, events: EventBus) -> Self {
        Self { repo, media, events }
    }

    pub async fn list(&self, filter: &ProjectFilter) -> Result<Vec<ProjectRecord>, ProjectError> {
        self.repo.list_projects(filter).await.map_err(Into::into)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProjectRecord, ProjectError> {
        self.repo
            .find_project(id)
            .await?
            .ok_or(ProjectError::NotFound)
    }

    pub async fn create(
        &self,
        input: ProjectInput,
        image: Option<InboundImage>,
    ) -> Result<ProjectRecord, ProjectError> {
        input.validate()?;

        // Binary first; if the insert below fails the stored binary is an
        // accepted orphan rather than a lost update.
        let asset = match image {
            Some(image) => Some(self.media.ingest(image).await?),
            None => None,
        };

        let record = self
            .repo
            .create_project(CreateProjectParams {
                title: input.title,
                description: input.description,
                category: input.category,
                tech_stack: input.tech_stack,
                github_url: input.github_url,
                live_url: input.live_url,
                featured: input.featured,
                image: asset,
            })
            .await?;

        self.events.publish(AppEvent::ProjectChanged { id: record.id });
        Ok(record)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: ProjectInput,
        change: ImageChange,
    ) -> Result<ProjectRecord, ProjectError> {
        input.validate()?;

        let existing = self.get(id).await?;
        let image = self
            .media
            .apply_change(existing.image.as_ref(), change)
            .await?;

        let record = self
            .repo
            .update_project(UpdateProjectParams {
                id,
                title: input.title,
                description: input.description,
                category: input.category,
                tech_stack: input.tech_stack,
                github_url: input.github_url,
                live_url: input.live_url,
                featured: input.featured,
                image,
            })
            .await?;

        self.events.publish(AppEvent::ProjectChanged { id });
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ProjectError> {
        let existing = self.get(id).await?;
        self.repo.delete_project(id).await?;

        // The record is gone; asset cleanup is best-effort by contract.
        if let Some(asset) = existing.image.as_ref() {
            self.media.discard(asset).await;
        }

        self.events.publish(AppEvent::ProjectChanged { id });
        Ok(())
    }
}
