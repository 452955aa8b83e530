//! GitHub REST v3 client backing the stats provider seam.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::application::stats::{ProviderError, StatsProvider};
use crate::config::GithubSettings;
use crate::domain::stats::{ActivityEvent, ProfileFacts, RepoFacts};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("plinth/", env!("CARGO_PKG_VERSION"));
const REPOS_PER_PAGE: u32 = 100;
const EVENTS_PER_PAGE: u32 = 30;

pub struct GithubClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(settings: &GithubSettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base: API_BASE.to_string(),
            token: settings.token.clone(),
        })
    }

    #[cfg(test)]
    fn with_base(base: String) -> Self {
        Self {
            http: Client::new(),
            base,
            token: None,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ProviderError> {
        let mut request = self
            .http
            .get(format!("{}{path}", self.base))
            .header(header::ACCEPT, "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::Unavailable(format!("GET {path} timed out"))
            } else {
                ProviderError::Unavailable(format!("GET {path} failed: {err}"))
            }
        })?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|err| ProviderError::Unavailable(format!("GET {path} bad body: {err}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Rejected(
                format!("GET {path} rejected with {}", response.status()),
            )),
            status => Err(ProviderError::Unavailable(format!(
                "GET {path} returned {status}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    public_repos: i64,
    followers: i64,
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    description: Option<String>,
    stargazers_count: i64,
    forks_count: i64,
    language: Option<String>,
    html_url: String,
    pushed_at: Option<String>,
    #[serde(default)]
    fork: bool,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    #[serde(rename = "type")]
    event_type: String,
    repo: ApiEventRepo,
    created_at: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiEventRepo {
    name: String,
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

#[async_trait]
impl StatsProvider for GithubClient {
    async fn profile(&self, username: &str) -> Result<ProfileFacts, ProviderError> {
        let user: ApiUser = self.get_json(&format!("/users/{username}")).await?;
        Ok(ProfileFacts {
            public_repos: user.public_repos,
            followers: user.followers,
        })
    }

    async fn repositories(&self, username: &str) -> Result<Vec<RepoFacts>, ProviderError> {
        let repos: Vec<ApiRepo> = self
            .get_json(&format!(
                "/users/{username}/repos?per_page={REPOS_PER_PAGE}&sort=pushed"
            ))
            .await?;

        Ok(repos
            .into_iter()
            .filter(|repo| !repo.fork)
            .map(|repo| RepoFacts {
                pushed_at: repo.pushed_at.as_deref().and_then(parse_timestamp),
                name: repo.name,
                description: repo.description,
                stars: repo.stargazers_count,
                forks: repo.forks_count,
                language: repo.language,
                html_url: repo.html_url,
            })
            .collect())
    }

    async fn repo_languages(
        &self,
        username: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, i64>, ProviderError> {
        self.get_json(&format!("/repos/{username}/{repo}/languages"))
            .await
    }

    async fn recent_events(&self, username: &str) -> Result<Vec<ActivityEvent>, ProviderError> {
        let events: Vec<ApiEvent> = self
            .get_json(&format!(
                "/users/{username}/events/public?per_page={EVENTS_PER_PAGE}"
            ))
            .await?;

        Ok(events
            .into_iter()
            .filter_map(|event| {
                let created_at = parse_timestamp(&event.created_at)?;
                // Keep the payload compact: only the fields the aggregate or
                // a frontend timeline cares about.
                let payload = match event.event_type.as_str() {
                    "PushEvent" => {
                        let commits = event
                            .payload
                            .get("commits")
                            .and_then(serde_json::Value::as_array)
                            .map(|commits| commits.len() as i64)
                            .or_else(|| {
                                event.payload.get("size").and_then(serde_json::Value::as_i64)
                            })
                            .unwrap_or(1);
                        serde_json::json!({ "commits": commits })
                    }
                    "CreateEvent" | "DeleteEvent" => serde_json::json!({
                        "ref": event.payload.get("ref"),
                        "ref_type": event.payload.get("ref_type"),
                    }),
                    _ => serde_json::json!({}),
                };

                Some(ActivityEvent {
                    event_type: event.event_type,
                    repo: event.repo.name,
                    created_at,
                    payload,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_repo_deserializes_github_shape() {
        let raw = r#"{
            "name": "plinth",
            "description": null,
            "stargazers_count": 12,
            "forks_count": 2,
            "language": "Rust",
            "html_url": "https://github.com/octocat/plinth",
            "pushed_at": "2026-08-01T10:30:00Z",
            "fork": false
        }"#;
        let repo: ApiRepo = serde_json::from_str(raw).unwrap();
        assert_eq!(repo.stargazers_count, 12);
        assert!(parse_timestamp(repo.pushed_at.as_deref().unwrap()).is_some());
    }

    #[test]
    fn push_event_payload_is_compacted() {
        let raw = r#"{
            "type": "PushEvent",
            "repo": { "name": "octocat/plinth" },
            "created_at": "2026-08-01T10:30:00Z",
            "payload": { "size": 3, "head": "abc", "before": "def" }
        }"#;
        let event: ApiEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, "PushEvent");
        assert_eq!(event.payload.get("size").unwrap(), 3);
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_unavailable() {
        // Nothing listens on the discard port; fails fast with refused.
        let client = GithubClient::with_base("http://127.0.0.1:9".to_string());
        let err = client.profile("octocat").await.expect_err("must fail");
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
