//! Pure aggregation of upstream GitHub data into a [`StatsSnapshot`].
//!
//! Everything here is deterministic and I/O-free; the cache-aside service in
//! the application layer feeds it whatever the provider calls returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// How many top repositories and activity events a snapshot retains.
pub const TOP_N: usize = 6;

/// The cached aggregate for one tracked username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub username: String,
    pub public_repos: i64,
    pub followers: i64,
    pub total_stars: i64,
    pub total_forks: i64,
    pub total_commits: i64,
    /// Language name to whole-percent share; empty when no language data.
    pub languages: BTreeMap<String, u32>,
    pub top_repos: Vec<TopRepo>,
    pub recent_activity: Vec<ActivityEvent>,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRepo {
    pub name: String,
    pub description: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub language: Option<String>,
    pub html_url: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub pushed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_type: String,
    pub repo: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Compact event-specific payload (commit count, ref name, ...).
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Identity summary from the mandatory profile call.
#[derive(Debug, Clone)]
pub struct ProfileFacts {
    pub public_repos: i64,
    pub followers: i64,
}

/// Per-repository facts from the mandatory repository listing, in provider
/// order.
#[derive(Debug, Clone)]
pub struct RepoFacts {
    pub name: String,
    pub description: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub language: Option<String>,
    pub html_url: String,
    pub pushed_at: Option<OffsetDateTime>,
}

/// Build a snapshot from whatever the refresh managed to fetch.
///
/// `languages_by_repo` and `events` come from best-effort detail calls and
/// may cover only a subset of repositories (or be empty outright).
pub fn aggregate(
    username: &str,
    profile: &ProfileFacts,
    repos: &[RepoFacts],
    languages_by_repo: &[BTreeMap<String, i64>],
    events: Vec<ActivityEvent>,
    fetched_at: OffsetDateTime,
) -> StatsSnapshot {
    let total_stars = repos.iter().map(|r| r.stars).sum();
    let total_forks = repos.iter().map(|r| r.forks).sum();

    StatsSnapshot {
        username: username.to_string(),
        public_repos: profile.public_repos,
        followers: profile.followers,
        total_stars,
        total_forks,
        total_commits: commit_count(&events),
        languages: language_shares(languages_by_repo),
        top_repos: rank_top_repos(repos, TOP_N),
        recent_activity: truncate_activity(events, TOP_N),
        fetched_at,
    }
}

/// Sum raw per-language magnitudes across repositories and normalize the
/// totals to whole-percent shares. A zero total yields an empty map.
pub fn language_shares(languages_by_repo: &[BTreeMap<String, i64>]) -> BTreeMap<String, u32> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for repo_languages in languages_by_repo {
        for (language, bytes) in repo_languages {
            if *bytes > 0 {
                *totals.entry(language.clone()).or_insert(0) += bytes;
            }
        }
    }

    let grand_total: i64 = totals.values().sum();
    if grand_total == 0 {
        return BTreeMap::new();
    }

    totals
        .into_iter()
        .map(|(language, bytes)| {
            let share = ((bytes as f64 / grand_total as f64) * 100.0).round() as u32;
            (language, share)
        })
        .filter(|(_, share)| *share > 0)
        .collect()
}

/// Select the `n` most-starred repositories, descending. `sort_by` is stable,
/// so ties keep the provider's original order.
pub fn rank_top_repos(repos: &[RepoFacts], n: usize) -> Vec<TopRepo> {
    let mut ranked: Vec<&RepoFacts> = repos.iter().collect();
    ranked.sort_by(|a, b| b.stars.cmp(&a.stars));

    ranked
        .into_iter()
        .take(n)
        .map(|repo| TopRepo {
            name: repo.name.clone(),
            description: repo.description.clone(),
            stars: repo.stars,
            forks: repo.forks,
            language: repo.language.clone(),
            html_url: repo.html_url.clone(),
            pushed_at: repo.pushed_at,
        })
        .collect()
}

fn truncate_activity(mut events: Vec<ActivityEvent>, n: usize) -> Vec<ActivityEvent> {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    events.truncate(n);
    events
}

/// Derive a commit counter from push events in the activity feed. The feed is
/// best-effort, so this is a floor rather than an exact career total.
fn commit_count(events: &[ActivityEvent]) -> i64 {
    events
        .iter()
        .filter(|event| event.event_type == "PushEvent")
        .map(|event| {
            event
                .payload
                .get("commits")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(1)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn repo(name: &str, stars: i64) -> RepoFacts {
        RepoFacts {
            name: name.to_string(),
            description: None,
            stars,
            forks: 0,
            language: None,
            html_url: format!("https://github.com/octocat/{name}"),
            pushed_at: None,
        }
    }

    #[test]
    fn language_shares_sum_close_to_hundred() {
        let shares = language_shares(&[
            BTreeMap::from([("Rust".to_string(), 7000), ("TOML".to_string(), 300)]),
            BTreeMap::from([("Rust".to_string(), 1500), ("Shell".to_string(), 1200)]),
        ]);

        let sum: u32 = shares.values().sum();
        assert!((98..=102).contains(&sum), "shares summed to {sum}");
        assert!(shares["Rust"] > shares["Shell"]);
    }

    #[test]
    fn language_shares_empty_when_no_data() {
        assert!(language_shares(&[]).is_empty());
        assert!(language_shares(&[BTreeMap::new()]).is_empty());
        // All-zero magnitudes must not divide by zero.
        assert!(language_shares(&[BTreeMap::from([("Rust".to_string(), 0)])]).is_empty());
    }

    #[test]
    fn top_repos_sorted_by_stars_with_stable_ties() {
        let repos = vec![
            repo("first-tie", 10),
            repo("winner", 50),
            repo("second-tie", 10),
            repo("last", 1),
        ];

        let ranked = rank_top_repos(&repos, 3);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["winner", "first-tie", "second-tie"]);
    }

    #[test]
    fn activity_truncated_to_most_recent() {
        let mut events = Vec::new();
        for hour in 0..10 {
            events.push(ActivityEvent {
                event_type: "PushEvent".to_string(),
                repo: "octocat/site".to_string(),
                created_at: datetime!(2026-01-01 00:00 UTC) + time::Duration::hours(hour),
                payload: json!({"commits": 2}),
            });
        }

        let snapshot = aggregate(
            "octocat",
            &ProfileFacts {
                public_repos: 12,
                followers: 34,
            },
            &[repo("site", 3)],
            &[],
            events,
            datetime!(2026-01-02 00:00 UTC),
        );

        assert_eq!(snapshot.recent_activity.len(), TOP_N);
        assert_eq!(
            snapshot.recent_activity[0].created_at,
            datetime!(2026-01-01 09:00 UTC)
        );
        // The commit counter sees the full feed, not the truncated tail.
        assert_eq!(snapshot.total_commits, 20);
        assert_eq!(snapshot.total_stars, 3);
    }
}
