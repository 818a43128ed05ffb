use std::str::FromStr;
use std::time::Duration;

use orchestrator_core::{config::DatabaseConfig, OrchestratorResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// SQLite 连接池与表结构管理
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// 按配置创建连接池，文件不存在时自动创建
    pub async fn new(config: &DatabaseConfig) -> OrchestratorResult<Self> {
        info!("连接SQLite数据库: {}", config.url);

        let connect_options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(1800)) // 30分钟默认生命周期
            .connect_with(connect_options)
            .await?;

        Ok(Self { pool })
    }

    /// 单连接内存数据库，进程内嵌和测试使用
    ///
    /// 连接关闭即丢失全部数据，因此连接永不因空闲或寿命到期被回收。
    pub async fn in_memory() -> OrchestratorResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 创建编排核心使用的表和索引
    pub async fn migrate(&self) -> OrchestratorResult<()> {
        debug!("Running SQLite database migrations");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                spider_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                node_id INTEGER,
                priority INTEGER NOT NULL DEFAULT 5,
                error TEXT,
                created_by INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_by INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS task_queue (
                id INTEGER PRIMARY KEY,
                priority INTEGER NOT NULL DEFAULT 5,
                node_id INTEGER,
                created_by INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_by INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS task_stats (
                id INTEGER PRIMARY KEY,
                result_count INTEGER NOT NULL DEFAULT 0,
                created_by INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_by INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                is_master INTEGER NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS spiders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                col_name TEXT NOT NULL,
                data_source_id INTEGER
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
            "CREATE INDEX IF NOT EXISTS idx_task_stats_created_at ON task_stats(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_results_collection ON results(collection)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("Successfully completed SQLite database migrations");
        Ok(())
    }

    pub async fn health_check(&self) -> OrchestratorResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// 生成 `?1, ?2, ...` 形式的 IN 子句占位符
pub(crate) fn in_placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_placeholders() {
        assert_eq!(in_placeholders(3), "?1, ?2, ?3");
        assert_eq!(in_placeholders(0), "");
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let manager = DatabaseManager::in_memory().await.unwrap();
        manager.migrate().await.unwrap();
        manager.migrate().await.unwrap();
        manager.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_connection_is_never_recycled() {
        let manager = DatabaseManager::in_memory().await.unwrap();
        let options = manager.pool().options();
        assert_eq!(options.get_max_connections(), 1);
        assert!(options.get_idle_timeout().is_none());
        assert!(options.get_max_lifetime().is_none());

        manager.migrate().await.unwrap();
        sqlx::query("INSERT INTO tasks (spider_id) VALUES (1)")
            .execute(manager.pool())
            .await
            .unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(manager.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
