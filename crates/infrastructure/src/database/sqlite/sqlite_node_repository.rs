use async_trait::async_trait;
use orchestrator_core::{models::Node, traits::NodeRepository, OrchestratorError, OrchestratorResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

pub struct SqliteNodeRepository {
    pool: SqlitePool,
}

impl SqliteNodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_node(row: &SqliteRow) -> OrchestratorResult<Node> {
        Ok(Node {
            id: row.try_get("id")?,
            key: row.try_get("key")?,
            name: row.try_get("name")?,
            is_master: row.try_get("is_master")?,
        })
    }

    /// 节点由集群成员管理写入，这里只提供注册入口
    pub async fn upsert(&self, node: &Node) -> OrchestratorResult<()> {
        sqlx::query(
            "INSERT INTO nodes (id, key, name, is_master) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET key = excluded.key, name = excluded.name, \
             is_master = excluded.is_master",
        )
        .bind(node.id)
        .bind(&node.key)
        .bind(&node.name)
        .bind(node.is_master)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 按节点标识注册当前进程所在节点，已存在时只更新主节点标记
    pub async fn register(&self, key: &str, is_master: bool) -> OrchestratorResult<Node> {
        sqlx::query(
            "INSERT INTO nodes (key, name, is_master) VALUES (?1, ?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET is_master = excluded.is_master",
        )
        .bind(key)
        .bind(is_master)
        .execute(&self.pool)
        .await?;

        self.get_by_key(key).await?.ok_or_else(|| {
            OrchestratorError::InconsistentState(format!("节点注册后无法读取: {key}"))
        })
    }

    pub async fn get_by_key(&self, key: &str) -> OrchestratorResult<Option<Node>> {
        let row = sqlx::query("SELECT id, key, name, is_master FROM nodes WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_node).transpose()
    }
}

#[async_trait]
impl NodeRepository for SqliteNodeRepository {
    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Node>> {
        let row = sqlx::query("SELECT id, key, name, is_master FROM nodes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_node).transpose()
    }
}
