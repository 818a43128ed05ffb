use async_trait::async_trait;
use orchestrator_core::{models::Record, traits::DocumentStore, OrchestratorResult};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// 默认结果存储：每条记录以 JSON 文本保存在 `results` 表中
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self, collection: &str) -> OrchestratorResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE collection = ?1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// 按插入顺序读取集合中的记录
    pub async fn find(&self, collection: &str, limit: i64) -> OrchestratorResult<Vec<Record>> {
        let rows = sqlx::query("SELECT data FROM results WHERE collection = ?1 ORDER BY id LIMIT ?2")
            .bind(collection)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> OrchestratorResult<Record> {
                let data: String = row.try_get("data")?;
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert_many(&self, collection: &str, records: &[Record]) -> OrchestratorResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            let data = serde_json::to_string(record)?;
            sqlx::query("INSERT INTO results (collection, data) VALUES (?1, ?2)")
                .bind(collection)
                .bind(data)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("写入 {} 条结果到集合 {}", records.len(), collection);
        Ok(())
    }
}
