use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateSkillParams, RepoError, SkillsRepo, UpdateSkillParams};
use crate::domain::entities::SkillRecord;
use crate::domain::media::MediaAsset;

use super::{PostgresRepositories, map_sqlx_error};

const SKILL_COLUMNS: &str =
    "id, name, category, proficiency, image_url, image_handle, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SkillRow {
    id: Uuid,
    name: String,
    category: String,
    proficiency: i32,
    image_url: Option<String>,
    image_handle: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SkillRow> for SkillRecord {
    fn from(row: SkillRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            proficiency: row.proficiency,
            image: MediaAsset::from_columns(row.image_url, row.image_handle),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SkillsRepo for PostgresRepositories {
    async fn list_skills(&self, category: Option<&str>) -> Result<Vec<SkillRecord>, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {SKILL_COLUMNS} FROM skills WHERE 1=1 "));

        if let Some(category) = category {
            qb.push(" AND category = ");
            qb.push_bind(category);
        }

        qb.push(" ORDER BY category, proficiency DESC, name ");

        let rows: Vec<SkillRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SkillRecord::from).collect())
    }

    async fn find_skill(&self, id: Uuid) -> Result<Option<SkillRecord>, RepoError> {
        let row: Option<SkillRow> =
            sqlx::query_as(&format!("SELECT {SKILL_COLUMNS} FROM skills WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(SkillRecord::from))
    }

    async fn create_skill(&self, params: CreateSkillParams) -> Result<SkillRecord, RepoError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let (image_url, image_handle) = match params.image {
            Some(asset) => (Some(asset.url), asset.deletion_handle),
            None => (None, None),
        };

        let row: SkillRow = sqlx::query_as(&format!(
            "INSERT INTO skills ({SKILL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {SKILL_COLUMNS}"
        ))
        .bind(id)
        .bind(params.name)
        .bind(params.category)
        .bind(params.proficiency)
        .bind(image_url)
        .bind(image_handle)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SkillRecord::from(row))
    }

    async fn update_skill(&self, params: UpdateSkillParams) -> Result<SkillRecord, RepoError> {
        let (image_url, image_handle) = match params.image {
            Some(asset) => (Some(asset.url), asset.deletion_handle),
            None => (None, None),
        };

        let row: SkillRow = sqlx::query_as(&format!(
            "UPDATE skills SET \
                name = $2, category = $3, proficiency = $4, \
                image_url = $5, image_handle = $6, updated_at = now() \
             WHERE id = $1 \
             RETURNING {SKILL_COLUMNS}"
        ))
        .bind(params.id)
        .bind(params.name)
        .bind(params.category)
        .bind(params.proficiency)
        .bind(image_url)
        .bind(image_handle)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SkillRecord::from(row))
    }

    async fn delete_skill(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
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
