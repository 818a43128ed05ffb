use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument, warn};

use orchestrator_core::{
    models::Record,
    traits::{DocumentStore, LogStore, StatRepository},
    OrchestratorResult,
};

use crate::resolver::DataSinkResolver;
use crate::writer::{DefaultStoreWriter, ExternalSinkWriter, ResultWriter};

/// 任务结果与日志写入服务
pub struct TaskStatsService {
    resolver: Arc<DataSinkResolver>,
    writer: Arc<dyn ResultWriter>,
    stat_repo: Arc<dyn StatRepository>,
    log_store: Arc<dyn LogStore>,
}

impl TaskStatsService {
    /// 写入方式跟随解析器的授权模式：外部数据源或默认文档存储
    pub fn new(
        resolver: Arc<DataSinkResolver>,
        stat_repo: Arc<dyn StatRepository>,
        document_store: Arc<dyn DocumentStore>,
        log_store: Arc<dyn LogStore>,
    ) -> Self {
        let writer: Arc<dyn ResultWriter> = if resolver.is_licensed() {
            Arc::new(ExternalSinkWriter::new(document_store))
        } else {
            Arc::new(DefaultStoreWriter::new(document_store))
        };

        Self::with_writer(resolver, writer, stat_repo, log_store)
    }

    pub fn with_writer(
        resolver: Arc<DataSinkResolver>,
        writer: Arc<dyn ResultWriter>,
        stat_repo: Arc<dyn StatRepository>,
        log_store: Arc<dyn LogStore>,
    ) -> Self {
        Self {
            resolver,
            writer,
            stat_repo,
            log_store,
        }
    }

    pub fn resolver(&self) -> &Arc<DataSinkResolver> {
        &self.resolver
    }

    /// 写入任务结果，返回成功写入的条数
    ///
    /// 结果数累加在后台完成，失败只记录日志。
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_data(&self, task_id: i64, records: Vec<Record>) -> OrchestratorResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let item = self.resolver.resolve(task_id).await?;
        let written = self.writer.write(&item, records).await?;
        counter!("orchestrator_results_ingested_total").increment(written);

        if written > 0 {
            let stat_repo = Arc::clone(&self.stat_repo);
            tokio::spawn(async move {
                if let Err(e) = stat_repo
                    .increment_result_count(task_id, written as i64)
                    .await
                {
                    warn!("更新任务 {} 结果数失败: {}", task_id, e);
                }
            });
        }

        debug!("任务 {} 写入 {} 条结果", task_id, written);
        Ok(written)
    }

    pub async fn insert_logs(&self, task_id: i64, lines: &[String]) -> OrchestratorResult<()> {
        self.log_store.write_lines(task_id, lines).await
    }
}
