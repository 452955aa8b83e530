//! Visitor analytics: append-only event log plus admin summaries.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AnalyticsRepo, RepoError, VisitorSummary};
use crate::domain::entities::VisitorEventRecord;
use crate::domain::error::{DomainError, require_nonempty};

const DEFAULT_SUMMARY_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct TrackInput {
    pub visitor_id: String,
    pub path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepo>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepo>) -> Self {
        Self { repo }
    }

    pub async fn track(&self, input: TrackInput) -> Result<(), AnalyticsError> {
        require_nonempty("visitor_id", &input.visitor_id)?;
        require_nonempty("path", &input.path)?;

        self.repo
            .append_event(VisitorEventRecord {
                id: Uuid::new_v4(),
                visitor_id: input.visitor_id,
                path: input.path,
                referrer: input.referrer.filter(|r| !r.is_empty()),
                user_agent: input.user_agent.filter(|ua| !ua.is_empty()),
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .map_err(Into::into)
    }

    pub async fn summary(&self, days: Option<u32>) -> Result<VisitorSummary, AnalyticsError> {
        let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS).clamp(1, 365);
        self.repo.summary(days).await.map_err(Into::into)
    }
}
