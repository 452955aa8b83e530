use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::application::repos::{RepoError, StatsCacheRepo};
use crate::domain::stats::{ActivityEvent, StatsSnapshot, TopRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    username: String,
    public_repos: i64,
    followers: i64,
    total_stars: i64,
    total_forks: i64,
    total_commits: i64,
    languages: Json<BTreeMap<String, u32>>,
    top_repos: Json<Vec<TopRepo>>,
    recent_activity: Json<Vec<ActivityEvent>>,
    fetched_at: OffsetDateTime,
}

impl From<SnapshotRow> for StatsSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            username: row.username,
            public_repos: row.public_repos,
            followers: row.followers,
            total_stars: row.total_stars,
            total_forks: row.total_forks,
            total_commits: row.total_commits,
            languages: row.languages.0,
            top_repos: row.top_repos.0,
            recent_activity: row.recent_activity.0,
            fetched_at: row.fetched_at,
        }
    }
}

#[async_trait]
impl StatsCacheRepo for PostgresRepositories {
    async fn load(&self, username: &str) -> Result<Option<StatsSnapshot>, RepoError> {
        let row: Option<SnapshotRow> = sqlx::query_as(
            "SELECT username, public_repos, followers, total_stars, total_forks, \
                    total_commits, languages, top_repos, recent_activity, fetched_at \
             FROM gh_stats_cache WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(StatsSnapshot::from))
    }

    async fn upsert(&self, snapshot: &StatsSnapshot) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO gh_stats_cache ( \
                username, public_repos, followers, total_stars, total_forks, \
                total_commits, languages, top_repos, recent_activity, fetched_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (username) DO UPDATE SET \
                public_repos = EXCLUDED.public_repos, \
                followers = EXCLUDED.followers, \
                total_stars = EXCLUDED.total_stars, \
                total_forks = EXCLUDED.total_forks, \
                total_commits = EXCLUDED.total_commits, \
                languages = EXCLUDED.languages, \
                top_repos = EXCLUDED.top_repos, \
                recent_activity = EXCLUDED.recent_activity, \
                fetched_at = EXCLUDED.fetched_at",
        )
        .bind(&snapshot.username)
        .bind(snapshot.public_repos)
        .bind(snapshot.followers)
        .bind(snapshot.total_stars)
        .bind(snapshot.total_forks)
        .bind(snapshot.total_commits)
        .bind(Json(&snapshot.languages))
        .bind(Json(&snapshot.top_repos))
        .bind(Json(&snapshot.recent_activity))
        .bind(snapshot.fetched_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
