//! Chatbot exchanges: canned reply, append-only log, daily aggregate.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::events::{AppEvent, EventBus};
use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{ChatDailyCount, ChatRepo, RepoError};
use crate::domain::chatbot;
use crate::domain::entities::ChatExchangeRecord;
use crate::domain::error::{DomainError, require_nonempty};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct ChatService {
    repo: Arc<dyn ChatRepo>,
    events: EventBus,
}

impl ChatService {
    pub fn new(repo: Arc<dyn ChatRepo>, events: EventBus) -> Self {
        Self { repo, events }
    }

    /// Answer a visitor message and append the exchange to the log.
    pub async fn chat(
        &self,
        message: String,
        session_id: Option<String>,
    ) -> Result<ChatExchangeRecord, ChatError> {
        require_nonempty("message", &message)?;

        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let (category, reply) = chatbot::respond(&message);

        let record = ChatExchangeRecord {
            id: Uuid::new_v4(),
            session_id: session_id.clone(),
            message,
            reply: reply.to_string(),
            category: category.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        self.repo.append_exchange(record.clone()).await?;

        self.events.publish(AppEvent::ChatMessage {
            session_id,
            category: category.to_string(),
        });

        Ok(record)
    }

    pub async fn history(&self, page: PageRequest) -> Result<Page<ChatExchangeRecord>, ChatError> {
        self.repo.list_exchanges(page).await.map_err(Into::into)
    }

    pub async fn daily(&self) -> Result<Vec<ChatDailyCount>, ChatError> {
        self.repo.daily_counts().await.map_err(Into::into)
    }
}
