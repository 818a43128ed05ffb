use async_trait::async_trait;
use orchestrator_core::{models::Spider, traits::SpiderRepository, OrchestratorResult};
use sqlx::{Row, SqlitePool};

pub struct SqliteSpiderRepository {
    pool: SqlitePool,
}

impl SqliteSpiderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, spider: &Spider) -> OrchestratorResult<()> {
        sqlx::query(
            "INSERT INTO spiders (id, name, col_name, data_source_id) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, col_name = excluded.col_name, \
             data_source_id = excluded.data_source_id",
        )
        .bind(spider.id)
        .bind(&spider.name)
        .bind(&spider.col_name)
        .bind(spider.data_source_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SpiderRepository for SqliteSpiderRepository {
    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Spider>> {
        let row = sqlx::query("SELECT id, name, col_name, data_source_id FROM spiders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> OrchestratorResult<Spider> {
            Ok(Spider {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                col_name: row.try_get("col_name")?,
                data_source_id: row.try_get("data_source_id")?,
            })
        })
        .transpose()
    }
}
