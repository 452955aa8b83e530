//! Blog posts: derived slugs, view/like counters, partial updates, comments.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{
    BlogFilter, BlogPostPatch, BlogRepo, CreateBlogPostParams, RepoError,
};
use crate::domain::entities::{BlogCommentRecord, BlogPostRecord};
use crate::domain::error::{DomainError, require_nonempty};
use crate::domain::slug::{SlugAsyncError, generate_unique_slug_async};

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<SlugAsyncError<RepoError>> for BlogError {
    fn from(err: SlugAsyncError<RepoError>) -> Self {
        match err {
            SlugAsyncError::Slug(slug_err) => {
                BlogError::Domain(DomainError::validation(slug_err.to_string()))
            }
            SlugAsyncError::Predicate(repo_err) => BlogError::Repo(repo_err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogPostInput {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub published: bool,
}

pub struct BlogService {
    repo: Arc<dyn BlogRepo>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> Result<Page<BlogPostRecord>, BlogError> {
        self.repo.list_posts(filter, page).await.map_err(Into::into)
    }

    /// Fetch by slug and bump the view counter; the returned record reflects
    /// the post-increment value. The increment is atomic at the store level.
    pub async fn read_by_slug(&self, slug: &str) -> Result<BlogPostRecord, BlogError> {
        self.repo
            .increment_views(slug)
            .await?
            .ok_or(BlogError::NotFound)
    }

    pub async fn create(&self, input: BlogPostInput) -> Result<BlogPostRecord, BlogError> {
        require_nonempty("title", &input.title)?;
        require_nonempty("excerpt", &input.excerpt)?;
        require_nonempty("content", &input.content)?;

        let slug = self.unique_slug(&input.title).await?;

        self.repo
            .create_post(CreateBlogPostParams {
                slug,
                title: input.title,
                excerpt: input.excerpt,
                content: input.content,
                tags: input.tags,
                published: input.published,
            })
            .await
            .map_err(Into::into)
    }

    /// Partial update built from exactly the supplied fields. An empty patch
    /// is a validation error; a new title re-derives the slug.
    pub async fn patch(
        &self,
        id: Uuid,
        mut patch: BlogPostPatch,
    ) -> Result<BlogPostRecord, BlogError> {
        if patch.is_empty() {
            return Err(BlogError::Domain(DomainError::validation(
                "update requires at least one field",
            )));
        }

        if let Some(title) = patch.title.as_deref() {
            require_nonempty("title", title)?;
            patch.slug = Some(self.unique_slug(title).await?);
        }

        match self.repo.patch_post(id, &patch).await {
            Ok(record) => Ok(record),
            Err(RepoError::NotFound) => Err(BlogError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Hard delete; comments cascade at the store level.
    pub async fn delete(&self, id: Uuid) -> Result<(), BlogError> {
        self.repo
            .find_post(id)
            .await?
            .ok_or(BlogError::NotFound)?;
        self.repo.delete_post(id).await.map_err(Into::into)
    }

    /// At-least-once like increment; returns the new counter.
    pub async fn like(&self, id: Uuid) -> Result<i64, BlogError> {
        self.repo
            .increment_likes(id)
            .await?
            .ok_or(BlogError::NotFound)
    }

    pub async fn comments(&self, slug: &str) -> Result<Vec<BlogCommentRecord>, BlogError> {
        let post = self
            .repo
            .find_post_by_slug(slug)
            .await?
            .ok_or(BlogError::NotFound)?;
        self.repo.list_comments(post.id).await.map_err(Into::into)
    }

    pub async fn add_comment(
        &self,
        slug: &str,
        author: String,
        body: String,
    ) -> Result<BlogCommentRecord, BlogError> {
        require_nonempty("author", &author)?;
        require_nonempty("body", &body)?;

        let post = self
            .repo
            .find_post_by_slug(slug)
            .await?
            .ok_or(BlogError::NotFound)?;
        self.repo
            .create_comment(post.id, author, body)
            .await
            .map_err(Into::into)
    }

    async fn unique_slug(&self, title: &str) -> Result<String, BlogError> {
        let repo = self.repo.clone();
        let slug = generate_unique_slug_async(title, |candidate| {
            let repo = repo.clone();
            let candidate = candidate.to_string();
            async move { repo.slug_exists(&candidate).await.map(|exists| !exists) }
        })
        .await?;
        Ok(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    #[derive(Default)]
    struct MemoryBlog {
        posts: Mutex<HashMap<Uuid, BlogPostRecord>>,
    }

    impl MemoryBlog {
        fn with_post(record: BlogPostRecord) -> Arc<Self> {
            let repo = Self::default();
            repo.posts.lock().unwrap().insert(record.id, record);
            Arc::new(repo)
        }
    }

    fn post(title: &str, slug: &str) -> BlogPostRecord {
        BlogPostRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: title.to_string(),
            excerpt: "excerpt".into(),
            content: "content".into(),
            tags: vec!["rust".into()],
            published: true,
            views: 0,
            likes: 0,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[async_trait]
    impl BlogRepo for MemoryBlog {
        async fn list_posts(
            &self,
            _filter: &BlogFilter,
            page: PageRequest,
        ) -> Result<Page<BlogPostRecord>, RepoError> {
            let items: Vec<_> = self.posts.lock().unwrap().values().cloned().collect();
            let total = items.len() as u64;
            Ok(Page::new(items, total, page))
        }

        async fn find_post(&self, id: Uuid) -> Result<Option<BlogPostRecord>, RepoError> {
            Ok(self.posts.lock().unwrap().get(&id).cloned())
        }

        async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPostRecord>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .values()
                .find(|p| p.slug == slug)
                .cloned())
        }

        async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
            Ok(self.posts.lock().unwrap().values().any(|p| p.slug == slug))
        }

        async fn create_post(
            &self,
            params: CreateBlogPostParams,
        ) -> Result<BlogPostRecord, RepoError> {
            let record = BlogPostRecord {
                id: Uuid::new_v4(),
                slug: params.slug,
                title: params.title,
                excerpt: params.excerpt,
                content: params.content,
                tags: params.tags,
                published: params.published,
                views: 0,
                likes: 0,
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            };
            self.posts
                .lock()
                .unwrap()
                .insert(record.id, record.clone());
            Ok(record)
        }

        async fn patch_post(
            &self,
            id: Uuid,
            patch: &BlogPostPatch,
        ) -> Result<BlogPostRecord, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            let record = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
            if let Some(title) = &patch.title {
                record.title = title.clone();
            }
            if let Some(slug) = &patch.slug {
                record.slug = slug.clone();
            }
            if let Some(views) = patch.views {
                record.views = views;
            }
            record.updated_at = OffsetDateTime::now_utc();
            Ok(record.clone())
        }

        async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
            self.posts.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn increment_views(&self, slug: &str) -> Result<Option<BlogPostRecord>, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            Ok(posts.values_mut().find(|p| p.slug == slug).map(|p| {
                p.views += 1;
                p.clone()
            }))
        }

        async fn increment_likes(&self, id: Uuid) -> Result<Option<i64>, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            Ok(posts.get_mut(&id).map(|p| {
                p.likes += 1;
                p.likes
            }))
        }

        async fn list_comments(&self, _post_id: Uuid) -> Result<Vec<BlogCommentRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn create_comment(
            &self,
            post_id: Uuid,
            author: String,
            body: String,
        ) -> Result<BlogCommentRecord, RepoError> {
            Ok(BlogCommentRecord {
                id: Uuid::new_v4(),
                post_id,
                author,
                body,
                created_at: OffsetDateTime::now_utc(),
            })
        }
    }

    #[tokio::test]
    async fn empty_patch_is_a_validation_error() {
        let record = post("Hello", "hello");
        let id = record.id;
        let service = BlogService::new(MemoryBlog::with_post(record));

        let err = service
            .patch(id, BlogPostPatch::default())
            .await
            .expect_err("empty patch must fail");
        assert!(matches!(err, BlogError::Domain(_)));
    }

    #[tokio::test]
    async fn views_patch_touches_only_views() {
        let record = post("Hello", "hello");
        let id = record.id;
        let service = BlogService::new(MemoryBlog::with_post(record.clone()));

        let updated = service
            .patch(
                id,
                BlogPostPatch {
                    views: Some(10),
                    ..Default::default()
                },
            )
            .await
            .expect("patched");

        assert_eq!(updated.views, 10);
        assert_eq!(updated.title, record.title);
        assert_eq!(updated.slug, record.slug);
        assert_eq!(updated.likes, record.likes);
        assert!(updated.updated_at >= record.updated_at);
    }

    #[tokio::test]
    async fn create_avoids_slug_collisions() {
        let service = BlogService::new(MemoryBlog::with_post(post("Hello World", "hello-world")));

        let created = service
            .create(BlogPostInput {
                title: "Hello, World!".into(),
                excerpt: "e".into(),
                content: "c".into(),
                tags: Vec::new(),
                published: true,
            })
            .await
            .expect("created");

        assert_eq!(created.slug, "hello-world-2");
    }

    #[tokio::test]
    async fn read_by_slug_reflects_post_increment_views() {
        let record = post("Hello", "hello");
        let service = BlogService::new(MemoryBlog::with_post(record));

        let first = service.read_by_slug("hello").await.expect("found");
        let second = service.read_by_slug("hello").await.expect("found");
        assert_eq!(first.views, 1);
        assert_eq!(second.views, 2);
    }

    #[tokio::test]
    async fn concurrent_likes_return_strictly_increasing_counts() {
        let record = post("Hello", "hello");
        let id = record.id;
        let service = Arc::new(BlogService::new(MemoryBlog::with_post(record)));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.like(id).await.unwrap() }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();
        let expected: Vec<i64> = (1..=16).collect();
        assert_eq!(seen, expected, "no two likes may report the same count");
    }
}
