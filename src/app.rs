use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use orchestrator_core::config::AppConfig;
use orchestrator_core::models::Node;
use orchestrator_dispatcher::{
    CleanupService, RecoveryService, TaskRecoveryService, TaskScheduler, TaskSchedulerService,
};
use orchestrator_infrastructure::{
    DatabaseManager, FileLogStore, InProcessStreamRegistry, LocalTaskRegistry,
    SqliteDocumentStore, SqliteNodeRepository, SqliteQueueItemRepository, SqliteSpiderRepository,
    SqliteStatRepository, SqliteTaskRepository,
};
use orchestrator_stats::{DataSinkResolver, TaskStatsService};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

/// 主应用程序
///
/// 组装持久化网关、调度器、恢复/清理服务和结果写入服务。
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    node: Node,
    scheduler: Arc<TaskSchedulerService>,
    recovery: Arc<dyn RecoveryService>,
    cleanup: Mutex<CleanupService>,
    stats: Arc<TaskStatsService>,
    local_tasks: Arc<LocalTaskRegistry>,
    streams: Arc<InProcessStreamRegistry>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let database = DatabaseManager::new(&config.database)
            .await
            .context("创建数据库连接池失败")?;
        Self::with_database(config, database).await
    }

    /// 使用已有的数据库连接创建应用
    pub async fn with_database(config: AppConfig, database: DatabaseManager) -> Result<Self> {
        info!("初始化编排器, 节点: {}", config.node.key);

        database.migrate().await.context("数据库迁移失败")?;

        let pool = database.pool().clone();
        let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let queue_repo = Arc::new(SqliteQueueItemRepository::new(pool.clone()));
        let stat_repo = Arc::new(SqliteStatRepository::new(pool.clone()));
        let node_repo = Arc::new(SqliteNodeRepository::new(pool.clone()));
        let spider_repo = Arc::new(SqliteSpiderRepository::new(pool.clone()));
        let document_store = Arc::new(SqliteDocumentStore::new(pool));

        let node = node_repo
            .register(&config.node.key, config.node.is_master)
            .await
            .context("注册当前节点失败")?;
        info!("当前节点 id={} master={}", node.id, node.is_master);

        let local_tasks = Arc::new(LocalTaskRegistry::new());
        let streams = Arc::new(InProcessStreamRegistry::new());

        let scheduler = Arc::new(TaskSchedulerService::new(
            task_repo.clone(),
            queue_repo.clone(),
            stat_repo.clone(),
            node_repo,
            local_tasks.clone(),
            streams.clone(),
            Duration::from_secs(config.scheduler.poll_interval_seconds),
        ));

        let recovery: Arc<dyn RecoveryService> = Arc::new(TaskRecoveryService::new(
            task_repo.clone(),
            queue_repo,
            scheduler.clone(),
            config.scheduler.recovery_concurrency,
        ));

        let cleanup =
            CleanupService::new(task_repo.clone(), stat_repo.clone(), config.cleanup.clone());

        // 进程内没有外部数据源注册表，授权模式下所有结果回退到默认存储
        let resolver = Arc::new(DataSinkResolver::new(
            task_repo,
            spider_repo,
            None,
            config.stats.licensed,
            Duration::from_secs(config.stats.cache_ttl_seconds),
        ));
        let log_store = Arc::new(FileLogStore::new(&config.log.task_log_dir));
        let stats = Arc::new(TaskStatsService::new(
            resolver,
            stat_repo,
            document_store,
            log_store,
        ));

        Ok(Self {
            config,
            database,
            node,
            scheduler,
            recovery,
            cleanup: Mutex::new(cleanup),
            stats,
            local_tasks,
            streams,
        })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn scheduler(&self) -> Arc<dyn TaskScheduler> {
        self.scheduler.clone()
    }

    pub fn stats(&self) -> &Arc<TaskStatsService> {
        &self.stats
    }

    pub fn local_tasks(&self) -> &Arc<LocalTaskRegistry> {
        &self.local_tasks
    }

    pub fn streams(&self) -> &Arc<InProcessStreamRegistry> {
        &self.streams
    }

    /// 运行后台组件直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.database.health_check().await.context("数据库健康检查失败")?;

        if self.node.is_master && self.config.scheduler.recovery_enabled {
            let recovery = Arc::clone(&self.recovery);
            tokio::spawn(async move {
                let report = recovery.recover_task_status().await;
                if report.errors.is_empty() {
                    info!(
                        "任务状态恢复完成: {} 个任务标记为异常, 清空 {} 个队列项, 耗时 {}ms",
                        report.marked_abnormal, report.queue_items_removed, report.duration_ms
                    );
                } else {
                    warn!(
                        "任务状态恢复部分失败: 成功 {}, 失败 {}, 错误: {:?}",
                        report.marked_abnormal, report.failed, report.errors
                    );
                }
            });
        }

        self.cleanup.lock().await.start();

        // 清扫任务只听本函数的停止信号，早于订阅到达的关闭信号也不会丢失
        let (sweeper_tx, sweeper_rx) = broadcast::channel(1);
        let sweeper = self.stats.resolver().clone().spawn_sweeper(
            Duration::from_secs(self.config.stats.cache_sweep_interval_seconds),
            sweeper_rx,
        );

        info!("编排器已启动");
        let _ = shutdown_rx.recv().await;
        info!("编排器开始停止后台组件");

        let _ = sweeper_tx.send(());

        self.cleanup.lock().await.stop().await;
        if let Err(e) = sweeper.await {
            error!("数据源缓存清扫任务异常退出: {e}");
        }
        self.database.close().await;

        info!("编排器已停止");
        Ok(())
    }
}
