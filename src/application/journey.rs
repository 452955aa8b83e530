//! Career journey timeline.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{JourneyRepo, RepoError, UpsertJourneyItemParams};
use crate::domain::entities::JourneyItemRecord;
use crate::domain::error::{DomainError, require_nonempty};

#[derive(Debug, Error)]
pub enum JourneyError {
    #[error("journey item not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct JourneyService {
    repo: Arc<dyn JourneyRepo>,
}

impl JourneyService {
    pub fn new(repo: Arc<dyn JourneyRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<JourneyItemRecord>, JourneyError> {
        self.repo.list_items().await.map_err(Into::into)
    }

    pub async fn create(
        &self,
        params: UpsertJourneyItemParams,
    ) -> Result<JourneyItemRecord, JourneyError> {
        validate(&params)?;
        self.repo.create_item(params).await.map_err(Into::into)
    }

    pub async fn update(
        &self,
        id: Uuid,
        params: UpsertJourneyItemParams,
    ) -> Result<JourneyItemRecord, JourneyError> {
        validate(&params)?;
        self.repo
            .find_item(id)
            .await?
            .ok_or(JourneyError::NotFound)?;
        self.repo.update_item(id, params).await.map_err(Into::into)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), JourneyError> {
        self.repo
            .find_item(id)
            .await?
            .ok_or(JourneyError::NotFound)?;
        self.repo.delete_item(id).await.map_err(Into::into)
    }
}

fn validate(params: &UpsertJourneyItemParams) -> Result<(), DomainError> {
    require_nonempty("title", &params.title)?;
    require_nonempty("organization", &params.organization)?;
    require_nonempty("period", &params.period)?;
    Ok(())
}
