use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use orchestrator_core::{
    traits::{SinkHandle, SinkRegistry, SpiderRepository, TaskRepository},
    OrchestratorError, OrchestratorResult, ResourceKind,
};
use orchestrator_infrastructure::{CacheStats, TtlCache};

/// 任务结果的写入目标
///
/// 只存在于解析器缓存中，缺失时从任务和爬虫记录重建。
#[derive(Clone)]
pub struct DataSinkItem {
    pub task_id: i64,
    pub spider_id: i64,
    /// 爬虫配置的外部数据源
    pub sink_id: Option<i64>,
    /// 已解析的外部数据源句柄，仅授权模式下存在
    pub sink: Option<Arc<dyn SinkHandle>>,
    /// 结果集合/表名
    pub table_name: String,
}

impl fmt::Debug for DataSinkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSinkItem")
            .field("task_id", &self.task_id)
            .field("spider_id", &self.spider_id)
            .field("sink_id", &self.sink_id)
            .field("has_sink", &self.sink.is_some())
            .field("table_name", &self.table_name)
            .finish()
    }
}

/// 按任务解析结果写入目标，并按最后访问时间缓存
pub struct DataSinkResolver {
    task_repo: Arc<dyn TaskRepository>,
    spider_repo: Arc<dyn SpiderRepository>,
    sink_registry: Option<Arc<dyn SinkRegistry>>,
    licensed: bool,
    cache: TtlCache<i64, Arc<DataSinkItem>>,
}

impl DataSinkResolver {
    /// 只有 `licensed` 为 true 且提供了 `sink_registry` 时才解析外部数据源，
    /// 否则所有结果写入默认存储
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        spider_repo: Arc<dyn SpiderRepository>,
        sink_registry: Option<Arc<dyn SinkRegistry>>,
        licensed: bool,
        ttl: Duration,
    ) -> Self {
        Self {
            task_repo,
            spider_repo,
            sink_registry,
            licensed,
            cache: TtlCache::new(ttl),
        }
    }

    /// 授权模式：结果逐条写入外部数据源
    pub fn is_licensed(&self) -> bool {
        self.licensed
    }

    pub async fn resolve(&self, task_id: i64) -> OrchestratorResult<Arc<DataSinkItem>> {
        self.cache
            .get_or_try_insert_with(task_id, || async move {
                counter!("orchestrator_sink_cache_misses_total").increment(1);
                self.build_item(task_id).await.map(Arc::new)
            })
            .await
    }

    async fn build_item(&self, task_id: i64) -> OrchestratorResult<DataSinkItem> {
        let task = self
            .task_repo
            .get_by_id(task_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found(ResourceKind::Task, task_id))?;

        let spider = self
            .spider_repo
            .get_by_id(task.spider_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found(ResourceKind::Spider, task.spider_id))?;

        let sink = match (self.licensed, &self.sink_registry, spider.data_source_id) {
            (true, Some(registry), Some(sink_id)) => Some(registry.resolve_sink(sink_id).await?),
            _ => None,
        };

        debug!(
            "解析任务 {} 的结果写入目标: table={}, sink={:?}",
            task_id, spider.col_name, spider.data_source_id
        );

        Ok(DataSinkItem {
            task_id,
            spider_id: spider.id,
            sink_id: spider.data_source_id,
            sink,
            table_name: spider.col_name,
        })
    }

    /// 清除过期缓存项，返回清除数量
    pub fn sweep(&self) -> usize {
        let evicted = self.cache.evict_expired();
        if evicted > 0 {
            debug!("清除 {} 个过期的数据源缓存项", evicted);
        }
        evicted
    }

    /// 启动后台清扫，收到关闭信号后退出
    pub fn spawn_sweeper(
        self: Arc<Self>,
        period: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // 首个 tick 立即完成，跳过
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep();
                    }
                    _ = shutdown_rx.recv() => {
                        info!("数据源缓存清扫已停止");
                        break;
                    }
                }
            }
        })
    }

    pub fn invalidate(&self, task_id: i64) {
        self.cache.remove(&task_id);
    }

    pub fn cached_items(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
