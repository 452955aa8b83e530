use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{ChatDailyCount, ChatRepo, RepoError};
use crate::domain::entities::ChatExchangeRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ExchangeRow {
    id: Uuid,
    session_id: String,
    message: String,
    reply: String,
    category: String,
    created_at: OffsetDateTime,
}

impl From<ExchangeRow> for ChatExchangeRecord {
    fn from(row: ExchangeRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            message: row.message,
            reply: row.reply,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ChatRepo for PostgresRepositories {
    async fn append_exchange(&self, record: ChatExchangeRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO chat_exchanges (id, session_id, message, reply, category, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.session_id)
        .bind(record.message)
        .bind(record.reply)
        .bind(record.category)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_exchanges(
        &self,
        page: PageRequest,
    ) -> Result<Page<ChatExchangeRecord>, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_exchanges")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let rows: Vec<ExchangeRow> = sqlx::query_as(
            "SELECT id, session_id, message, reply, category, created_at \
             FROM chat_exchanges ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(Page::new(
            rows.into_iter().map(ChatExchangeRecord::from).collect(),
            total.max(0) as u64,
            page,
        ))
    }

    async fn daily_counts(&self) -> Result<Vec<ChatDailyCount>, RepoError> {
        #[derive(sqlx::FromRow)]
        struct DailyRow {
            day: Date,
            messages: i64,
            sessions: i64,
        }

        let rows: Vec<DailyRow> = sqlx::query_as(
            "SELECT created_at::date AS day, \
                    COUNT(*) AS messages, \
                    COUNT(DISTINCT session_id) AS sessions \
             FROM chat_exchanges \
             GROUP BY day \
             ORDER BY day DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ChatDailyCount {
                day: row.day,
                messages: row.messages,
                sessions: row.sessions,
            })
            .collect())
    }
}
