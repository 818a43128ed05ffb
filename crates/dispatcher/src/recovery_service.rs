use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use metrics::counter;
use tracing::{error, info, warn};

use orchestrator_core::{
    models::{TaskStatus, SYSTEM_ACTOR},
    traits::{QueueItemRepository, TaskRepository},
};

use crate::scheduler::TaskScheduler;

/// 恢复时写入任务的错误信息
pub const STATE_LOST_MESSAGE: &str = "task state lost after master restart";

/// 恢复服务接口
#[async_trait]
pub trait RecoveryService: Send + Sync {
    /// 主节点启动时重置任务状态
    ///
    /// 所有 pending/running 任务改写为 abnormal，随后清空任务队列。
    /// 失败只记录在报告中，不向外传播。
    async fn recover_task_status(&self) -> RecoveryReport;
}

/// 恢复报告
#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    pub marked_abnormal: u64,
    pub failed: u64,
    pub queue_items_removed: u64,
    pub duration_ms: u64,
    pub errors: Vec<String>,
}

/// 恢复服务实现
pub struct TaskRecoveryService {
    task_repo: Arc<dyn TaskRepository>,
    queue_repo: Arc<dyn QueueItemRepository>,
    scheduler: Arc<dyn TaskScheduler>,
    concurrency: usize,
}

impl TaskRecoveryService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        queue_repo: Arc<dyn QueueItemRepository>,
        scheduler: Arc<dyn TaskScheduler>,
        concurrency: usize,
    ) -> Self {
        Self {
            task_repo,
            queue_repo,
            scheduler,
            concurrency: concurrency.max(1),
        }
    }

    async fn mark_stale_tasks(&self, report: &mut RecoveryReport) {
        let tasks = match self
            .task_repo
            .get_by_statuses(&[TaskStatus::Pending, TaskStatus::Running])
            .await
        {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("查询待恢复任务失败: {}", e);
                report.errors.push(format!("查询待恢复任务失败: {e}"));
                return;
            }
        };

        if tasks.is_empty() {
            return;
        }
        info!("发现 {} 个需要重置的任务", tasks.len());

        let results: Vec<_> = stream::iter(tasks)
            .map(|mut task| {
                let scheduler = Arc::clone(&self.scheduler);
                async move {
                    let task_id = task.id;
                    task.status = TaskStatus::Abnormal;
                    if task.error.as_deref().map_or(true, str::is_empty) {
                        task.error = Some(STATE_LOST_MESSAGE.to_string());
                    }
                    (task_id, scheduler.save_task(task, SYSTEM_ACTOR).await)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (task_id, result) in results {
            match result {
                Ok(_) => report.marked_abnormal += 1,
                Err(e) => {
                    warn!("重置任务 {} 状态失败: {}", task_id, e);
                    report.failed += 1;
                    report.errors.push(format!("任务 {task_id}: {e}"));
                }
            }
        }
    }
}

#[async_trait]
impl RecoveryService for TaskRecoveryService {
    async fn recover_task_status(&self) -> RecoveryReport {
        let start = Instant::now();
        let mut report = RecoveryReport::default();

        info!("开始恢复任务状态");
        self.mark_stale_tasks(&mut report).await;

        // 无论上一步是否成功都清空队列
        match self.queue_repo.delete_all().await {
            Ok(removed) => report.queue_items_removed = removed,
            Err(e) => {
                error!("清空任务队列失败: {}", e);
                report.errors.push(format!("清空任务队列失败: {e}"));
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        counter!("orchestrator_recovery_marked_abnormal_total").increment(report.marked_abnormal);

        info!(
            "任务状态恢复完成: 标记异常 {} 个, 失败 {} 个, 清除队列项 {} 个, 耗时 {}ms",
            report.marked_abnormal, report.failed, report.queue_items_removed, report.duration_ms
        );
        report
    }
}
