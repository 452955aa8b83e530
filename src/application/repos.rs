//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::pagination::{Page, PageRequest};
use crate::domain::entities::{
    BlogCommentRecord, BlogPostRecord, ChatExchangeRecord, ContactMessageRecord, JourneyItemRecord,
    JourneyKind, ProjectRecord, SkillRecord, UserRecord, VisitorEventRecord,
};
use crate::domain::media::MediaAsset;
use crate::domain::stats::StatsSnapshot;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectParams {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tech_stack: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub image: Option<MediaAsset>,
}

#[derive(Debug, Clone)]
pub struct UpdateProjectParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tech_stack: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub image: Option<MediaAsset>,
}

#[async_trait]
pub trait ProjectsRepo: Send + Sync {
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectRecord>, RepoError>;
    async fn find_project(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepoError>;
    async fn create_project(&self, params: CreateProjectParams) -> Result<ProjectRecord, RepoError>;
    async fn update_project(&self, params: UpdateProjectParams) -> Result<ProjectRecord, RepoError>;
    async fn delete_project(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateSkillParams {
    pub name: String,
    pub category: String,
    pub proficiency: i32,
    pub image: Option<MediaAsset>,
}

#[derive(Debug, Clone)]
pub struct UpdateSkillParams {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub proficiency: i32,
    pub image: Option<MediaAsset>,
}

#[async_trait]
pub trait SkillsRepo: Send + Sync {
    async fn list_skills(&self, category: Option<&str>) -> Result<Vec<SkillRecord>, RepoError>;
    async fn find_skill(&self, id: Uuid) -> Result<Option<SkillRecord>, RepoError>;
    async fn create_skill(&self, params: CreateSkillParams) -> Result<SkillRecord, RepoError>;
    async fn update_skill(&self, params: UpdateSkillParams) -> Result<SkillRecord, RepoError>;
    async fn delete_skill(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    pub tag: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateBlogPostParams {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub published: bool,
}

/// The allow-listed field set for partial blog updates. `None` means "leave
/// untouched"; the repository maps every `Some` to one parameterized
/// assignment. Unknown keys never reach this struct — the HTTP boundary
/// rejects them during deserialization.
#[derive(Debug, Clone, Default)]
pub struct BlogPostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
}

impl BlogPostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.excerpt.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.published.is_none()
            && self.views.is_none()
            && self.likes.is_none()
    }
}

#[async_trait]
pub trait BlogRepo: Send + Sync {
    async fn list_posts(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> Result<Page<BlogPostRecord>, RepoError>;
    async fn find_post(&self, id: Uuid) -> Result<Option<BlogPostRecord>, RepoError>;
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPostRecord>, RepoError>;
    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;
    async fn create_post(&self, params: CreateBlogPostParams) -> Result<BlogPostRecord, RepoError>;
    async fn patch_post(&self, id: Uuid, patch: &BlogPostPatch)
    -> Result<BlogPostRecord, RepoError>;
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
    /// Atomic `views = views + 1` returning the post-increment record.
    async fn increment_views(&self, slug: &str) -> Result<Option<BlogPostRecord>, RepoError>;
    /// Atomic `likes = likes + 1` returning the new counter.
    async fn increment_likes(&self, id: Uuid) -> Result<Option<i64>, RepoError>;
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<BlogCommentRecord>, RepoError>;
    async fn create_comment(
        &self,
        post_id: Uuid,
        author: String,
        body: String,
    ) -> Result<BlogCommentRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct UpsertJourneyItemParams {
    pub title: String,
    pub organization: String,
    pub kind: JourneyKind,
    pub period: String,
    pub description: String,
    pub sort_order: i32,
}

#[async_trait]
pub trait JourneyRepo: Send + Sync {
    async fn list_items(&self) -> Result<Vec<JourneyItemRecord>, RepoError>;
    async fn find_item(&self, id: Uuid) -> Result<Option<JourneyItemRecord>, RepoError>;
    async fn create_item(
        &self,
        params: UpsertJourneyItemParams,
    ) -> Result<JourneyItemRecord, RepoError>;
    async fn update_item(
        &self,
        id: Uuid,
        params: UpsertJourneyItemParams,
    ) -> Result<JourneyItemRecord, RepoError>;
    async fn delete_item(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ContactRepo: Send + Sync {
    async fn insert_message(
        &self,
        name: String,
        email: String,
        subject: String,
        body: String,
    ) -> Result<ContactMessageRecord, RepoError>;
}

/// One day's worth of chatbot traffic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChatDailyCount {
    pub day: Date,
    pub messages: i64,
    pub sessions: i64,
}

#[async_trait]
pub trait ChatRepo: Send + Sync {
    async fn append_exchange(&self, record: ChatExchangeRecord) -> Result<(), RepoError>;
    async fn list_exchanges(
        &self,
        page: PageRequest,
    ) -> Result<Page<ChatExchangeRecord>, RepoError>;
    async fn daily_counts(&self) -> Result<Vec<ChatDailyCount>, RepoError>;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PathCount {
    pub path: String,
    pub count: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DayCount {
    pub day: Date,
    pub count: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VisitorSummary {
    pub total_events: i64,
    pub unique_visitors: i64,
    pub top_paths: Vec<PathCount>,
    pub daily: Vec<DayCount>,
}

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn append_event(&self, record: VisitorEventRecord) -> Result<(), RepoError>;
    async fn summary(&self, days: u32) -> Result<VisitorSummary, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;
}

/// The single-row-per-username GitHub stats cache.
#[async_trait]
pub trait StatsCacheRepo: Send + Sync {
    async fn load(&self, username: &str) -> Result<Option<StatsSnapshot>, RepoError>;
    /// Insert-or-overwrite; the stored row is always the most recent
    /// *successful* fetch.
    async fn upsert(&self, snapshot: &StatsSnapshot) -> Result<(), RepoError>;
}

/// Age of a snapshot relative to `now`, clamped at zero.
pub fn snapshot_age(snapshot: &StatsSnapshot, now: OffsetDateTime) -> time::Duration {
    (now - snapshot.fetched_at).max(time::Duration::ZERO)
}
