use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ContactRepo, RepoError};
use crate::domain::entities::ContactMessageRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    subject: String,
    body: String,
    created_at: OffsetDateTime,
}

#[async_trait]
impl ContactRepo for PostgresRepositories {
    async fn insert_message(
        &self,
        name: String,
        email: String,
        subject: String,
        body: String,
    ) -> Result<ContactMessageRecord, RepoError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let row: ContactRow = sqlx::query_as(
            "INSERT INTO contact_messages (id, name, email, subject, body, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, email, subject, body, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(body)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactMessageRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            body: row.body,
            created_at: row.created_at,
        })
    }
}
