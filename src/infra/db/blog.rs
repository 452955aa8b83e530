use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{
    BlogFilter, BlogPostPatch, BlogRepo, CreateBlogPostParams, RepoError,
};
use crate::domain::entities::{BlogCommentRecord, BlogPostRecord};

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str =
    "id, slug, title, excerpt, content, tags, published, views, likes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    slug: String,
    title: String,
    excerpt: String,
    content: String,
    tags: Json<Vec<String>>,
    published: bool,
    views: i64,
    likes: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for BlogPostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            content: row.content,
            tags: row.tags.0,
            published: row.published,
            views: row.views,
            likes: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author: String,
    body: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for BlogCommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author: row.author,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

fn apply_post_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q BlogFilter) {
    if let Some(published) = filter.published {
        qb.push(" AND published = ");
        qb.push_bind(published);
    }
    if let Some(tag) = filter.tag.as_ref() {
        qb.push(" AND tags @> ");
        qb.push_bind(Json(vec![tag.clone()]));
    }
}

#[async_trait]
impl BlogRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> Result<Page<BlogPostRecord>, RepoError> {
        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM blog_posts WHERE 1=1 ");
        apply_post_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE 1=1 "));
        apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows: Vec<PostRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(Page::new(
            rows.into_iter().map(BlogPostRecord::from).collect(),
            total.max(0) as u64,
            page,
        ))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<BlogPostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BlogPostRecord::from))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BlogPostRecord::from))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM blog_posts WHERE slug = $1)")
                .bind(slug)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn create_post(&self, params: CreateBlogPostParams) -> Result<BlogPostRecord, RepoError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let row: PostRow = sqlx::query_as(&format!(
            "INSERT INTO blog_posts ({POST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, 0, $8, $8) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(params.slug)
        .bind(params.title)
        .bind(params.excerpt)
        .bind(params.content)
        .bind(Json(params.tags))
        .bind(params.published)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(BlogPostRecord::from(row))
    }

    async fn patch_post(
        &self,
        id: Uuid,
        patch: &BlogPostPatch,
    ) -> Result<BlogPostRecord, RepoError> {
        // Every Some field becomes exactly one parameterized assignment.
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE blog_posts SET ");
        let mut fields = qb.separated(", ");

        if let Some(title) = patch.title.as_ref() {
            fields.push("title = ").push_bind_unseparated(title);
        }
        if let Some(slug) = patch.slug.as_ref() {
            fields.push("slug = ").push_bind_unseparated(slug);
        }
        if let Some(excerpt) = patch.excerpt.as_ref() {
            fields.push("excerpt = ").push_bind_unseparated(excerpt);
        }
        if let Some(content) = patch.content.as_ref() {
            fields.push("content = ").push_bind_unseparated(content);
        }
        if let Some(tags) = patch.tags.as_ref() {
            fields
                .push("tags = ")
                .push_bind_unseparated(Json(tags.clone()));
        }
        if let Some(published) = patch.published {
            fields
                .push("published = ")
                .push_bind_unseparated(published);
        }
        if let Some(views) = patch.views {
            fields.push("views = ").push_bind_unseparated(views);
        }
        if let Some(likes) = patch.likes {
            fields.push("likes = ").push_bind_unseparated(likes);
        }
        fields.push("updated_at = now()");

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {POST_COLUMNS}"));

        let row: Option<PostRow> = qb
            .build_query_as()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(BlogPostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        // Comments go with the post via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn increment_views(&self, slug: &str) -> Result<Option<BlogPostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "UPDATE blog_posts SET views = views + 1 WHERE slug = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BlogPostRecord::from))
    }

    async fn increment_likes(&self, id: Uuid) -> Result<Option<i64>, RepoError> {
        let likes: Option<i64> =
            sqlx::query_scalar("UPDATE blog_posts SET likes = likes + 1 WHERE id = $1 RETURNING likes")
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(likes)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<BlogCommentRecord>, RepoError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, post_id, author, body, created_at \
             FROM blog_comments WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BlogCommentRecord::from).collect())
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        author: String,
        body: String,
    ) -> Result<BlogCommentRecord, RepoError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let row: CommentRow = sqlx::query_as(
            "INSERT INTO blog_comments (id, post_id, author, body, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, post_id, author, body, created_at",
        )
        .bind(id)
        .bind(post_id)
        .bind(author)
        .bind(body)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(BlogCommentRecord::from(row))
    }
}
