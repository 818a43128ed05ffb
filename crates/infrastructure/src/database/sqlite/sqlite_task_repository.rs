use async_trait::async_trait;
use orchestrator_core::{
    models::{Audit, Task, TaskStatus},
    traits::TaskRepository,
    OrchestratorError, OrchestratorResult, ResourceKind,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, instrument};

use crate::database::manager::in_placeholders;

const TASK_COLUMNS: &str = "id, spider_id, status, node_id, priority, error, \
     created_by, created_at, updated_by, updated_at";

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &SqliteRow) -> OrchestratorResult<Task> {
        Ok(Task {
            id: row.try_get("id")?,
            spider_id: row.try_get("spider_id")?,
            status: row.try_get("status")?,
            node_id: row.try_get("node_id")?,
            priority: row.try_get("priority")?,
            error: row.try_get("error")?,
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
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, task), fields(spider_id = task.spider_id))]
    async fn create(&self, task: &Task) -> OrchestratorResult<Task> {
        // id 为 0 时绑定 NULL，由 AUTOINCREMENT 生成
        let id = (!task.is_new()).then_some(task.id);
        let result = sqlx::query(
            "INSERT INTO tasks (id, spider_id, status, node_id, priority, error, \
             created_by, created_at, updated_by, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(id)
        .bind(task.spider_id)
        .bind(task.status)
        .bind(task.node_id)
        .bind(task.priority)
        .bind(&task.error)
        .bind(task.audit.created_by)
        .bind(task.audit.created_at)
        .bind(task.audit.updated_by)
        .bind(task.audit.updated_at)
        .execute(&self.pool)
        .await?;

        let mut created = task.clone();
        created.id = result.last_insert_rowid();
        debug!("创建任务成功: {}", created.id);
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    #[instrument(skip(self, task), fields(task_id = task.id, status = %task.status))]
    async fn replace(&self, task: &Task) -> OrchestratorResult<()> {
        let result = sqlx::query(
            "UPDATE tasks SET spider_id = ?2, status = ?3, node_id = ?4, priority = ?5, \
             error = ?6, created_by = ?7, created_at = ?8, updated_by = ?9, updated_at = ?10 \
             WHERE id = ?1",
        )
        .bind(task.id)
        .bind(task.spider_id)
        .bind(task.status)
        .bind(task.node_id)
        .bind(task.priority)
        .bind(&task.error)
        .bind(task.audit.created_by)
        .bind(task.audit.created_at)
        .bind(task.audit.updated_by)
        .bind(task.audit.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found(ResourceKind::Task, task.id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> OrchestratorResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_statuses(&self, statuses: &[TaskStatus]) -> OrchestratorResult<Vec<Task>> {
        if statuses.is_empty() {
            return Ok(vec![]);
        }

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status IN ({}) ORDER BY id",
            in_placeholders(statuses.len())
        );
        let mut query = sqlx::query(&sql);
        for status in statuses {
            query = query.bind(*status);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_task).collect()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_by_ids(&self, ids: &[i64]) -> OrchestratorResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!("DELETE FROM tasks WHERE id IN ({})", in_placeholders(ids.len()));
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
