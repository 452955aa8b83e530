use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateProjectParams, ProjectFilter, ProjectsRepo, RepoError, UpdateProjectParams,
};
use crate::domain::entities::ProjectRecord;
use crate::domain::media::MediaAsset;

use super::{PostgresRepositories, map_sqlx_error};

const PROJECT_COLUMNS: &str = "id, title, description, category, tech_stack, github_url, \
     live_url, featured, image_url, image_handle, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    tech_stack: Json<Vec<String>>,
    github_url: Option<String>,
    live_url: Option<String>,
    featured: bool,
    image_url: Option<String>,
    image_handle: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ProjectRow> for ProjectRecord {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            tech_stack: row.tech_stack.0,
            github_url: row.github_url,
            live_url: row.live_url,
            featured: row.featured,
            image: MediaAsset::from_columns(row.image_url, row.image_handle),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProjectsRepo for PostgresRepositories {
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectRecord>, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE 1=1 "));

        if let Some(category) = filter.category.as_ref() {
            qb.push(" AND category = ");
            qb.push_bind(category);
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND featured = ");
            qb.push_bind(featured);
        }

        qb.push(" ORDER BY featured DESC, created_at DESC ");

        let rows: Vec<ProjectRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ProjectRecord::from).collect())
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepoError> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProjectRecord::from))
    }

    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let (image_url, image_handle) = split_image(params.image);

        let row: ProjectRow = sqlx::query_as(&format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(params.title)
        .bind(params.description)
        .bind(params.category)
        .bind(Json(params.tech_stack))
        .bind(params.github_url)
        .bind(params.live_url)
        .bind(params.featured)
        .bind(image_url)
        .bind(image_handle)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ProjectRecord::from(row))
    }

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let (image_url, image_handle) = split_image(params.image);

        let row: ProjectRow = sqlx::query_as(&format!(
            "UPDATE projects SET \
                title = $2, description = $3, category = $4, tech_stack = $5, \
                github_url = $6, live_url = $7, featured = $8, \
                image_url = $9, image_handle = $10, updated_at = now() \
             WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(params.id)
        .bind(params.title)
        .bind(params.description)
        .bind(params.category)
        .bind(Json(params.tech_stack))
        .bind(params.github_url)
        .bind(params.live_url)
        .bind(params.featured)
        .bind(image_url)
        .bind(image_handle)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ProjectRecord::from(row))
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
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

fn split_image(image: Option<MediaAsset>) -> (Option<String>, Option<String>) {
    match image {
        Some(asset) => (Some(asset.url), asset.deletion_handle),
        None => (None, None),
    }
}
