use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{JourneyRepo, RepoError, UpsertJourneyItemParams};
use crate::domain::entities::{JourneyItemRecord, JourneyKind};

use super::{PostgresRepositories, map_sqlx_error};

const JOURNEY_COLUMNS: &str =
    "id, title, organization, kind, period, description, sort_order, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct JourneyRow {
    id: Uuid,
    title: String,
    organization: String,
    kind: String,
    period: String,
    description: String,
    sort_order: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<JourneyRow> for JourneyItemRecord {
    type Error = RepoError;

    fn try_from(row: JourneyRow) -> Result<Self, Self::Error> {
        let kind = JourneyKind::parse(&row.kind).ok_or_else(|| {
            RepoError::from_persistence(format!("unknown journey kind `{}`", row.kind))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            organization: row.organization,
            kind,
            period: row.period,
            description: row.description,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl JourneyRepo for PostgresRepositories {
    async fn list_items(&self) -> Result<Vec<JourneyItemRecord>, RepoError> {
        let rows: Vec<JourneyRow> = sqlx::query_as(&format!(
            "SELECT {JOURNEY_COLUMNS} FROM journey_items ORDER BY sort_order, created_at"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JourneyItemRecord::try_from).collect()
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<JourneyItemRecord>, RepoError> {
        let row: Option<JourneyRow> = sqlx::query_as(&format!(
            "SELECT {JOURNEY_COLUMNS} FROM journey_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(JourneyItemRecord::try_from).transpose()
    }

    async fn create_item(
        &self,
        params: UpsertJourneyItemParams,
    ) -> Result<JourneyItemRecord, RepoError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let row: JourneyRow = sqlx::query_as(&format!(
            "INSERT INTO journey_items ({JOURNEY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {JOURNEY_COLUMNS}"
        ))
        .bind(id)
        .bind(params.title)
        .bind(params.organization)
        .bind(params.kind.as_str())
        .bind(params.period)
        .bind(params.description)
        .bind(params.sort_order)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        JourneyItemRecord::try_from(row)
    }

    async fn update_item(
        &self,
        id: Uuid,
        params: UpsertJourneyItemParams,
    ) -> Result<JourneyItemRecord, RepoError> {
        let row: Option<JourneyRow> = sqlx::query_as(&format!(
            "UPDATE journey_items SET \
                title = $2, organization = $3, kind = $4, period = $5, \
                description = $6, sort_order = $7, updated_at = now() \
             WHERE id = $1 \
             RETURNING {JOURNEY_COLUMNS}"
        ))
        .bind(id)
        .bind(params.title)
        .bind(params.organization)
        .bind(params.kind.as_str())
        .bind(params.period)
        .bind(params.description)
        .bind(params.sort_order)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(JourneyItemRecord::try_from)
            .transpose()?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM journey_items WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
