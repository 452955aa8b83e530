//! Cache-aside GitHub stats: read the cached snapshot, refresh through the
//! upstream provider when it has gone stale, and fall back to the last
//! successful snapshot when the upstream is down.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::application::repos::{RepoError, StatsCacheRepo, snapshot_age};
use crate::domain::stats::{ActivityEvent, ProfileFacts, RepoFacts, StatsSnapshot, aggregate};

/// Upstream failures, split by whether retrying soon is worthwhile.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network errors, timeouts, and 5xx responses.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    /// Credential problems (401/403). Retrying without operator action is
    /// pointless, but the taxonomy matters more for logging than behavior.
    #[error("upstream rejected the request: {0}")]
    Rejected(String),
}

/// The external stats provider adapter. Calls must carry a bounded timeout.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn profile(&self, username: &str) -> Result<ProfileFacts, ProviderError>;
    async fn repositories(&self, username: &str) -> Result<Vec<RepoFacts>, ProviderError>;
    async fn repo_languages(
        &self,
        username: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, i64>, ProviderError>;
    async fn recent_events(&self, username: &str) -> Result<Vec<ActivityEvent>, ProviderError>;
}

#[derive(Debug, Error)]
pub enum StatsError {
    /// No cache exists and the upstream failed; nothing to serve.
    #[error("no stats available: {reason}")]
    NoData { reason: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// How the served snapshot relates to the freshness threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Refreshed by this very request.
    Fresh,
    /// Served from cache within the threshold.
    Cached,
    /// The refresh failed; this is the last successful snapshot.
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReply {
    #[serde(flatten)]
    pub snapshot: StatsSnapshot,
    pub freshness: Freshness,
    /// Snapshot age in seconds; populated for cached and stale replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<u64>,
}

enum RefreshFailure {
    Upstream(ProviderError),
    Store(RepoError),
}

pub struct StatsService {
    cache: Arc<dyn StatsCacheRepo>,
    provider: Arc<dyn StatsProvider>,
    freshness: Duration,
}

impl StatsService {
    pub fn new(
        cache: Arc<dyn StatsCacheRepo>,
        provider: Arc<dyn StatsProvider>,
        freshness: std::time::Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            freshness: Duration::try_from(freshness).unwrap_or(Duration::minutes(15)),
        }
    }

    /// Answer "current stats for `username`" per the cache-aside contract.
    ///
    /// Concurrent calls for the same username may race through the refresh
    /// path; that is tolerated redundant work — the upsert is idempotent with
    /// respect to "most recent successful fetch" and the last writer wins.
    pub async fn current(&self, username: &str) -> Result<StatsReply, StatsError> {
        let now = OffsetDateTime::now_utc();
        let cached = self.cache.load(username).await?;

        if let Some(snapshot) = &cached {
            let age = snapshot_age(snapshot, now);
            if age < self.freshness {
                counter!("plinth_stats_cache_hit_total").increment(1);
                return Ok(StatsReply {
                    snapshot: snapshot.clone(),
                    freshness: Freshness::Cached,
                    age_seconds: Some(age.whole_seconds().max(0) as u64),
                });
            }
        }

        counter!("plinth_stats_cache_miss_total").increment(1);

        match self.refresh(username, now).await {
            Ok(snapshot) => Ok(StatsReply {
                snapshot,
                freshness: Freshness::Fresh,
                age_seconds: None,
            }),
            Err(RefreshFailure::Store(err)) => Err(StatsError::Repo(err)),
            Err(RefreshFailure::Upstream(err)) => {
                counter!("plinth_stats_refresh_failure_total").increment(1);
                warn!(username, error = %err, "stats refresh failed");

                match cached {
                    Some(snapshot) => {
                        let age = snapshot_age(&snapshot, now);
                        Ok(StatsReply {
                            age_seconds: Some(age.whole_seconds().max(0) as u64),
                            snapshot,
                            freshness: Freshness::Stale,
                        })
                    }
                    None => Err(StatsError::NoData {
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }

    /// One refresh attempt. Profile and repository listing are mandatory;
    /// language detail and the event feed are independently best-effort and
    /// contribute nothing when they fail. The cache is written on success
    /// only.
    async fn refresh(
        &self,
        username: &str,
        now: OffsetDateTime,
    ) -> Result<StatsSnapshot, RefreshFailure> {
        let profile = self
            .provider
            .profile(username)
            .await
            .map_err(RefreshFailure::Upstream)?;
        let repos = self
            .provider
            .repositories(username)
            .await
            .map_err(RefreshFailure::Upstream)?;

        let mut languages_by_repo = Vec::with_capacity(repos.len());
        for repo in &repos {
            match self.provider.repo_languages(username, &repo.name).await {
                Ok(languages) => languages_by_repo.push(languages),
                Err(err) => {
                    debug!(username, repo = %repo.name, error = %err, "language detail skipped");
                }
            }
        }

        let events = match self.provider.recent_events(username).await {
            Ok(events) => events,
            Err(err) => {
                debug!(username, error = %err, "event feed skipped");
                Vec::new()
            }
        };

        let snapshot = aggregate(username, &profile, &repos, &languages_by_repo, events, now);

        self.cache
            .upsert(&snapshot)
            .await
            .map_err(RefreshFailure::Store)?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryCache {
        row: Mutex<Option<StatsSnapshot>>,
    }

    impl MemoryCache {
        fn empty() -> Self {
            Self {
                row: Mutex::new(None),
            }
        }

        fn seeded(snapshot: StatsSnapshot) -> Self {
            Self {
                row: Mutex::new(Some(snapshot)),
            }
        }
    }

    #[async_trait]
    impl StatsCacheRepo for MemoryCache {
        async fn load(&self, _username: &str) -> Result<Option<StatsSnapshot>, RepoError> {
            Ok(self.row.lock().unwrap().clone())
        }

        async fn upsert(&self, snapshot: &StatsSnapshot) -> Result<(), RepoError> {
            *self.row.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }

    struct ScriptedProvider {
        healthy: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn healthy() -> Self {
            Self {
                healthy: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                healthy: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsProvider for ScriptedProvider {
        async fn profile(&self, _username: &str) -> Result<ProfileFacts, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(ProfileFacts {
                    public_repos: 8,
                    followers: 21,
                })
            } else {
                Err(ProviderError::Unavailable("connect timeout".into()))
            }
        }

        async fn repositories(&self, _username: &str) -> Result<Vec<RepoFacts>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(vec![RepoFacts {
                    name: "plinth".into(),
                    description: None,
                    stars: 40,
                    forks: 3,
                    language: Some("Rust".into()),
                    html_url: "https://github.com/octocat/plinth".into(),
                    pushed_at: None,
                }])
            } else {
                Err(ProviderError::Unavailable("connect timeout".into()))
            }
        }

        async fn repo_languages(
            &self,
            _username: &str,
            _repo: &str,
        ) -> Result<BTreeMap<String, i64>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Detail calls failing must not abort the refresh.
            Err(ProviderError::Unavailable("503".into()))
        }

        async fn recent_events(&self, _username: &str) -> Result<Vec<ActivityEvent>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn snapshot_aged(seconds: i64) -> StatsSnapshot {
        StatsSnapshot {
            username: "octocat".into(),
            public_repos: 5,
            followers: 10,
            total_stars: 7,
            total_forks: 1,
            total_commits: 42,
            languages: BTreeMap::new(),
            top_repos: Vec::new(),
            recent_activity: Vec::new(),
            fetched_at: OffsetDateTime::now_utc() - Duration::seconds(seconds),
        }
    }

    fn service(cache: Arc<MemoryCache>, provider: Arc<ScriptedProvider>) -> StatsService {
        StatsService::new(cache, provider, std::time::Duration::from_secs(15 * 60))
    }

    #[tokio::test]
    async fn fresh_cache_answers_without_upstream_calls() {
        let cache = Arc::new(MemoryCache::seeded(snapshot_aged(60)));
        let provider = Arc::new(ScriptedProvider::healthy());
        let reply = service(cache, provider.clone())
            .current("octocat")
            .await
            .expect("reply");

        assert_eq!(reply.freshness, Freshness::Cached);
        assert_eq!(reply.snapshot.total_commits, 42);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn stale_cache_triggers_refresh_and_upsert() {
        let cache = Arc::new(MemoryCache::seeded(snapshot_aged(3600)));
        let provider = Arc::new(ScriptedProvider::healthy());
        let reply = service(cache.clone(), provider.clone())
            .current("octocat")
            .await
            .expect("reply");

        assert_eq!(reply.freshness, Freshness::Fresh);
        assert_eq!(reply.snapshot.total_stars, 40);
        assert!(provider.call_count() >= 2);

        let stored = cache.load("octocat").await.unwrap().unwrap();
        assert_eq!(stored.total_stars, 40);
        // Failed language detail contributed nothing.
        assert!(stored.languages.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_serves_stale_snapshot_with_age() {
        let cache = Arc::new(MemoryCache::seeded(snapshot_aged(7200)));
        let provider = Arc::new(ScriptedProvider::failing());
        let reply = service(cache.clone(), provider)
            .current("octocat")
            .await
            .expect("reply");

        assert_eq!(reply.freshness, Freshness::Stale);
        assert!(reply.age_seconds.unwrap() >= 7200);
        // A failed refresh never overwrites the stored snapshot.
        let stored = cache.load("octocat").await.unwrap().unwrap();
        assert_eq!(stored.total_commits, 42);
    }

    #[tokio::test]
    async fn no_cache_and_failed_upstream_is_no_data() {
        let cache = Arc::new(MemoryCache::empty());
        let provider = Arc::new(ScriptedProvider::failing());
        let err = service(cache, provider)
            .current("octocat")
            .await
            .expect_err("must fail");

        assert!(matches!(err, StatsError::NoData { .. }));
    }
}
