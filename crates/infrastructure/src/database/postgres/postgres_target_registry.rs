use async_trait::async_trait;
use chrono::Utc;
use balancer_core::{
    errors::{BalancerError, BalancerResult},
    models::{Job, JobStatus, Target, TargetLoad},
    traits::TargetRegistry,
};
use sqlx::{PgPool, Row};
use tracing::debug;

const TARGET_LOAD_SELECT: &str = r#"
    SELECT
        t.id,
        t.name,
        t.url,
        t.healthy,
        t.last_checked,
        COUNT(j.id) AS running_count
    FROM scraper_targets t
    LEFT JOIN scraper_jobs j
        ON t.id = j.target_id AND j.status = 'running'
"#;

const TARGET_LOAD_GROUP_BY: &str = "GROUP BY t.id, t.name, t.url, t.healthy, t.last_checked";

/// PostgreSQL目标节点注册表实现
pub struct PostgresTargetRegistry {
    pool: PgPool,
}

impl PostgresTargetRegistry {
    /// 创建新的PostgreSQL目标节点注册表
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 将数据库行转换为Target模型
    fn row_to_target(row: &sqlx::postgres::PgRow) -> BalancerResult<Target> {
        Ok(Target {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            healthy: row.try_get("healthy")?,
            last_checked: row.try_get("last_checked")?,
        })
    }

    fn row_to_target_load(row: &sqlx::postgres::PgRow) -> BalancerResult<TargetLoad> {
        Ok(TargetLoad {
            target: Self::row_to_target(row)?,
            running_count: row.try_get("running_count")?,
        })
    }

    fn row_to_job(row: &sqlx::postgres::PgRow) -> BalancerResult<Job> {
        Ok(Job {
            id: row.try_get("id")?,
            job_type: row.try_get("job_type")?,
            payload: row.try_get("payload")?,
            status: row.try_get("status")?,
            target_id: row.try_get("target_id")?,
            created_at: row.try_get("created_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            result: row.try_get("result")?,
            error_message: row.try_get("error_message")?,
            retry_count: row.try_get("retry_count")?,
        })
    }

    async fn fetch_target_loads(&self, query: &str) -> BalancerResult<Vec<TargetLoad>> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(BalancerError::Database)?;

        rows.iter().map(Self::row_to_target_load).collect()
    }
}

#[async_trait]
impl TargetRegistry for PostgresTargetRegistry {
    async fn list_targets_with_load(&self) -> BalancerResult<Vec<TargetLoad>> {
        let query = format!("{TARGET_LOAD_SELECT} {TARGET_LOAD_GROUP_BY} ORDER BY t.id ASC");
        self.fetch_target_loads(&query).await
    }

    async fn list_healthy_targets_with_load(&self) -> BalancerResult<Vec<TargetLoad>> {
        let query = format!(
            "{TARGET_LOAD_SELECT} WHERE t.healthy = TRUE {TARGET_LOAD_GROUP_BY} \
             ORDER BY running_count ASC, t.id ASC"
        );
        self.fetch_target_loads(&query).await
    }

    async fn get_target(&self, id: i64) -> BalancerResult<Target> {
        let row = sqlx::query(
            "SELECT id, name, url, healthy, last_checked FROM scraper_targets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(BalancerError::Database)?;

        match row {
            Some(row) => Self::row_to_target(&row),
            None => Err(BalancerError::target_not_found(id)),
        }
    }

    async fn set_target_health(&self, id: i64, healthy: bool) -> BalancerResult<()> {
        sqlx::query("UPDATE scraper_targets SET healthy = $1, last_checked = $2 WHERE id = $3")
            .bind(healthy)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(BalancerError::Database)?;

        debug!(target_id = id, healthy, "更新目标节点健康状态");
        Ok(())
    }

    async fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
        target_id: Option<i64>,
    ) -> BalancerResult<()> {
        let now = Utc::now();
        let query = match status {
            JobStatus::Running => sqlx::query(
                "UPDATE scraper_jobs SET status = $1, target_id = $2, started_at = $3 WHERE id = $4",
            )
            .bind(status)
            .bind(target_id)
            .bind(now)
            .bind(id),
            JobStatus::Completed | JobStatus::Failed => {
                sqlx::query("UPDATE scraper_jobs SET status = $1, completed_at = $2 WHERE id = $3")
                    .bind(status)
                    .bind(now)
                    .bind(id)
            }
            JobStatus::Pending => sqlx::query("UPDATE scraper_jobs SET status = $1 WHERE id = $2")
                .bind(status)
                .bind(id),
        };

        query
            .execute(&self.pool)
            .await
            .map_err(BalancerError::Database)?;

        debug!(job_id = id, %status, ?target_id, "更新任务状态");
        Ok(())
    }

    async fn set_job_result(
        &self,
        id: i64,
        result: Option<Vec<u8>>,
        error_message: &str,
    ) -> BalancerResult<()> {
        let now = Utc::now();
        if !error_message.is_empty() {
            sqlx::query(
                "UPDATE scraper_jobs SET status = $1, completed_at = $2, error_message = $3, result = NULL WHERE id = $4",
            )
            .bind(JobStatus::Failed)
            .bind(now)
            .bind(error_message)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(BalancerError::Database)?;

            debug!(job_id = id, error_message, "任务记录为失败");
            return Ok(());
        }

        sqlx::query(
            "UPDATE scraper_jobs SET status = $1, completed_at = $2, result = $3, error_message = NULL WHERE id = $4",
        )
        .bind(JobStatus::Completed)
        .bind(now)
        .bind(result)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(BalancerError::Database)?;

        debug!(job_id = id, "任务记录为完成");
        Ok(())
    }

    async fn get_job(&self, id: i64) -> BalancerResult<Job> {
        let row = sqlx::query(
            r#"
            SELECT id, job_type, payload, status, target_id, created_at, started_at,
                   completed_at, result, error_message, retry_count
            FROM scraper_jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(BalancerError::Database)?;

        match row {
            Some(row) => Self::row_to_job(&row),
            None => Err(BalancerError::job_not_found(id)),
        }
    }
}
