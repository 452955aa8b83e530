//! Skill entries; same media lifecycle as projects, smaller surface.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::media::{ImageChange, InboundImage, MediaError, MediaService};
use crate::application::repos::{CreateSkillParams, RepoError, SkillsRepo, UpdateSkillParams};
use crate::domain::entities::SkillRecord;
use crate::domain::error::{DomainError, require_nonempty};

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("skill not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct SkillInput {
    pub name: String,
    pub category: String,
    pub proficiency: i32,
}

impl SkillInput {
    fn validate(&self) -> Result<(), DomainError> {
        require_nonempty("name", &self.name)?;
        require_nonempty("category", &self.category)?;
        if !(0..=100).contains(&self.proficiency) {
            return Err(DomainError::invalid(
                "proficiency",
                "must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

pub struct SkillService {
    repo: Arc<dyn SkillsRepo>,
    media: Arc<MediaService>,
}

impl SkillService {
    pub fn new(repo: Arc<dyn SkillsRepo>, media: Arc<MediaService>) -> Self {
        Self { repo, media }
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<SkillRecord>, SkillError> {
        self.repo.list_skills(category).await.map_err(Into::into)
    }

    pub async fn get(&self, id: Uuid) -> Result<SkillRecord, SkillError> {
        self.repo.find_skill(id).await?.ok_or(SkillError::NotFound)
    }

    pub async fn create(
        &self,
        input: SkillInput,
        image: Option<InboundImage>,
    ) -> Result<SkillRecord, SkillError> {
        input.validate()?;

        let asset = match image {
            Some(image) => Some(self.media.ingest(image).await?),
            None => None,
        };

        self.repo
            .create_skill(CreateSkillParams {
                name: input.name,
                category: input.category,
                proficiency: input.proficiency,
                image: asset,
            })
            .await
            .map_err(Into::into)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: SkillInput,
        change: ImageChange,
    ) -> Result<SkillRecord, SkillError> {
        input.validate()?;

        let existing = self.get(id).await?;
        let image = self
            .media
            .apply_change(existing.image.as_ref(), change)
            .await?;

        self.repo
            .update_skill(UpdateSkillParams {
                id,
                name: input.name,
                category: input.category,
                proficiency: input.proficiency,
                image,
            })
            .await
            .map_err(Into::into)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), SkillError> {
        let existing = self.get(id).await?;
        self.repo.delete_skill(id).await?;

        if let Some(asset) = existing.image.as_ref() {
            self.media.discard(asset).await;
        }

        Ok(())
    }
}
