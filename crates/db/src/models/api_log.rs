use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// One outbound call to the language model provider.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApiLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub provider: String,
    pub endpoint: String,
    pub status_code: Option<i64>,
    pub success: bool,
    pub latency_ms: i64,
    pub prompt_chars: i64,
    pub response_chars: i64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateApiLog {
    pub user_id: Option<Uuid>,
    pub provider: String,
    pub endpoint: String,
    pub status_code: Option<i64>,
    pub success: bool,
    pub latency_ms: i64,
    pub prompt_chars: i64,
    pub response_chars: i64,
    pub error: Option<String>,
}

/// Aggregate over a time window, for the admin dashboard.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ApiLogStats {
    pub total: i64,
    pub errors: i64,
    pub avg_latency_ms: Option<f64>,
}

const API_LOG_COLUMNS: &str = "id, user_id, provider, endpoint, status_code, success, latency_ms, prompt_chars, response_chars, error, created_at";

impl ApiLog {
    pub async fn create(pool: &SqlitePool, data: &CreateApiLog) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ApiLog>(&format!(
            "INSERT INTO api_logs (id, user_id, provider, endpoint, status_code, success, latency_ms, prompt_chars, response_chars, error, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {API_LOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(&data.provider)
        .bind(&data.endpoint)
        .bind(data.status_code)
        .bind(data.success)
        .bind(data.latency_ms)
        .bind(data.prompt_chars)
        .bind(data.response_chars)
        .bind(&data.error)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Newest first.
    pub async fn recent(
        pool: &SqlitePool,
        limit: i64,
        errors_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let filter = if errors_only { " WHERE success = 0" } else { "" };
        sqlx::query_as::<_, ApiLog>(&format!(
            "SELECT {API_LOG_COLUMNS} FROM api_logs{filter}
             ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn stats_since(
        pool: &SqlitePool,
        since: DateTime<Utc>,
    ) -> Result<ApiLogStats, sqlx::Error> {
        sqlx::query_as::<_, ApiLogStats>(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END), 0) AS errors,
                    AVG(latency_ms) AS avg_latency_ms
             FROM api_logs
             WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Delete rows older than `cutoff`, returning how many were removed.
    pub async fn prune_before(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM api_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM api_logs")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_utils::create_test_pool;

    fn call(success: bool, latency_ms: i64) -> CreateApiLog {
        CreateApiLog {
            provider: "gemini".into(),
            endpoint: "generateContent".into(),
            status_code: Some(if success { 200 } else { 500 }),
            success,
            latency_ms,
            error: (!success).then(|| "upstream failure".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stats_and_error_filter() {
        let (pool, _tmp) = create_test_pool().await;
        ApiLog::create(&pool, &call(true, 100)).await.unwrap();
        ApiLog::create(&pool, &call(true, 300)).await.unwrap();
        ApiLog::create(&pool, &call(false, 200)).await.unwrap();

        let stats = ApiLog::stats_since(&pool, Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.avg_latency_ms, Some(200.0));

        let errors = ApiLog::recent(&pool, 10, true).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error.as_deref(), Some("upstream failure"));
        assert_eq!(ApiLog::recent(&pool, 2, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_window_has_no_average() {
        let (pool, _tmp) = create_test_pool().await;
        let stats = ApiLog::stats_since(&pool, Utc::now()).await.unwrap();
        assert_eq!(stats, ApiLogStats::default());
    }

    #[tokio::test]
    async fn prune_removes_older_rows() {
        let (pool, _tmp) = create_test_pool().await;
        ApiLog::create(&pool, &call(true, 10)).await.unwrap();

        let removed = ApiLog::prune_before(&pool, Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        let removed = ApiLog::prune_before(&pool, Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ApiLog::count(&pool).await.unwrap(), 0);
    }
}
