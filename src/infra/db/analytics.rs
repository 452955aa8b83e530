use async_trait::async_trait;
use time::Date;

use crate::application::repos::{
    AnalyticsRepo, DayCount, PathCount, RepoError, VisitorSummary,
};
use crate::domain::entities::VisitorEventRecord;

use super::{PostgresRepositories, map_sqlx_error};

const TOP_PATHS: i64 = 10;

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn append_event(&self, record: VisitorEventRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO visitor_events (id, visitor_id, path, referrer, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.visitor_id)
        .bind(record.path)
        .bind(record.referrer)
        .bind(record.user_agent)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn summary(&self, days: u32) -> Result<VisitorSummary, RepoError> {
        let days = i64::from(days);

        #[derive(sqlx::FromRow)]
        struct TotalsRow {
            total_events: i64,
            unique_visitors: i64,
        }

        let totals: TotalsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total_events, \
                    COUNT(DISTINCT visitor_id) AS unique_visitors \
             FROM visitor_events \
             WHERE created_at >= now() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        #[derive(sqlx::FromRow)]
        struct PathRow {
            path: String,
            count: i64,
        }

        let top_paths: Vec<PathRow> = sqlx::query_as(
            "SELECT path, COUNT(*) AS count \
             FROM visitor_events \
             WHERE created_at >= now() - make_interval(days => $1) \
             GROUP BY path \
             ORDER BY count DESC, path \
             LIMIT $2",
        )
        .bind(days)
        .bind(TOP_PATHS)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        #[derive(sqlx::FromRow)]
        struct DayRow {
            day: Date,
            count: i64,
        }

        let daily: Vec<DayRow> = sqlx::query_as(
            "SELECT created_at::date AS day, COUNT(*) AS count \
             FROM visitor_events \
             WHERE created_at >= now() - make_interval(days => $1) \
             GROUP BY day \
             ORDER BY day",
        )
        .bind(days)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(VisitorSummary {
            total_events: totals.total_events,
            unique_visitors: totals.unique_visitors,
            top_paths: top_paths
                .into_iter()
                .map(|row| PathCount {
                    path: row.path,
                    count: row.count,
                })
                .collect(),
            daily: daily
                .into_iter()
                .map(|row| DayCount {
                    day: row.day,
                    count: row.count,
                })
                .collect(),
        })
    }
}
