use std::sync::Arc;

use crate::application::analytics::AnalyticsService;
use crate::application::auth::AuthService;
use crate::application::blog::BlogService;
use crate::application::chatbot::ChatService;
use crate::application::contact::ContactService;
use crate::application::events::EventBus;
use crate::application::journey::JourneyService;
use crate::application::projects::ProjectService;
use crate::application::skills::SkillService;
use crate::application::stats::StatsService;
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::UploadStorage;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub projects: Arc<ProjectService>,
    pub skills: Arc<SkillService>,
    pub blog: Arc<BlogService>,
    pub journey: Arc<JourneyService>,
    pub contact: Arc<ContactService>,
    pub chat: Arc<ChatService>,
    pub analytics: Arc<AnalyticsService>,
    pub stats: Arc<StatsService>,
    /// Username served by the stats endpoint.
    pub stats_username: Arc<str>,
    pub storage: Arc<UploadStorage>,
    pub db: Arc<PostgresRepositories>,
    pub events: EventBus,
    pub allowed_origins: Arc<[String]>,
}
