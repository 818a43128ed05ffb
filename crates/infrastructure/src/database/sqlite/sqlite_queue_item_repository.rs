use async_trait::async_trait;
use orchestrator_core::{
    models::{Audit, QueueItem},
    traits::QueueItemRepository,
    OrchestratorResult,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

pub struct SqliteQueueItemRepository {
    pool: SqlitePool,
}

impl SqliteQueueItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &SqliteRow) -> OrchestratorResult<QueueItem> {
        Ok(QueueItem {
            id: row.try_get("id")?,
            priority: row.try_get("priority")?,
            node_id: row.try_get("node_id")?,
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
impl QueueItemRepository for SqliteQueueItemRepository {
    async fn create(&self, item: &QueueItem) -> OrchestratorResult<()> {
        sqlx::query(
            "INSERT INTO task_queue (id, priority, node_id, created_by, created_at, updated_by, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(item.id)
        .bind(item.priority)
        .bind(item.node_id)
        .bind(item.audit.created_by)
        .bind(item.audit.created_at)
        .bind(item.audit.updated_by)
        .bind(item.audit.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<QueueItem>> {
        let row = sqlx::query(
            "SELECT id, priority, node_id, created_by, created_at, updated_by, updated_at \
             FROM task_queue WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn delete(&self, id: i64) -> OrchestratorResult<()> {
        sqlx::query("DELETE FROM task_queue WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> OrchestratorResult<u64> {
        let result = sqlx::query("DELETE FROM task_queue")
            .execute(&self.pool)
            .await?;
        debug!("清空任务队列: {} 条", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn count(&self) -> OrchestratorResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
