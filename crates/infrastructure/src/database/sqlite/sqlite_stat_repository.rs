use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orchestrator_core::{
    models::{Audit, Stat},
    traits::StatRepository,
    OrchestratorError, OrchestratorResult, ResourceKind,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::database::manager::in_placeholders;

pub struct SqliteStatRepository {
    pool: SqlitePool,
}

impl SqliteStatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_stat(row: &SqliteRow) -> OrchestratorResult<Stat> {
        Ok(Stat {
            id: row.try_get("id")?,
            result_count: row.try_get("result_count")?,
            audit: Audit {
                created_by: row.try_get("created_by")?,
                created_at: row.try_get("created_at")?,
                updated_by: row.try_get("updated_by")?,
                updated_at: row.try_get("updated_at")?,
            },
        })
    }
}

#[async_trait]
impl StatRepository for SqliteStatRepository {
    async fn create(&self, stat: &Stat) -> OrchestratorResult<()> {
        sqlx::query(
            "INSERT INTO task_stats (id, result_count, created_by, created_at, updated_by, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(stat.id)
        .bind(stat.result_count)
        .bind(stat.audit.created_by)
        .bind(stat.audit.created_at)
        .bind(stat.audit.updated_by)
        .bind(stat.audit.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Stat>> {
        let row = sqlx::query(
            "SELECT id, result_count, created_by, created_at, updated_by, updated_at \
             FROM task_stats WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_stat).transpose()
    }

    async fn delete(&self, id: i64) -> OrchestratorResult<()> {
        sqlx::query("DELETE FROM task_stats WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_created_before(&self, cutoff: DateTime<Utc>) -> OrchestratorResult<Vec<Stat>> {
        let rows = sqlx::query(
            "SELECT id, result_count, created_by, created_at, updated_by, updated_at \
             FROM task_stats WHERE created_at < ?1 ORDER BY id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_stat).collect()
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> OrchestratorResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM task_stats WHERE id IN ({})",
            in_placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn increment_result_count(&self, id: i64, delta: i64) -> OrchestratorResult<()> {
        let result = sqlx::query(
            "UPDATE task_stats SET result_count = result_count + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found(ResourceKind::Stat, id));
        }
        Ok(())
    }
}
