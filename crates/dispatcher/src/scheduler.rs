use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, error, info, instrument, warn};

use orchestrator_core::{
    models::{ActorId, Node, QueueItem, Stat, Task, TaskStatus},
    traits::{
        LocalTaskHandler, NodeRepository, QueueItemRepository, StatRepository, StreamRegistry,
        TaskControlMessage, TaskRepository,
    },
    OrchestratorError, OrchestratorResult, ResourceKind,
};

/// 取消请求的实际处理路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// 任务仍在等待，只删除了队列项
    Dequeued,
    /// 主节点本地执行组件已取消，任务标记为 cancelled
    CancelledLocally,
    /// 取消指令已发往Worker，终态由Worker上报
    SentToWorker,
    /// 无法送达，任务被标记为 abnormal
    MarkedAbnormal,
}

impl CancelOutcome {
    fn as_label(&self) -> &'static str {
        match self {
            CancelOutcome::Dequeued => "dequeued",
            CancelOutcome::CancelledLocally => "local",
            CancelOutcome::SentToWorker => "remote",
            CancelOutcome::MarkedAbnormal => "abnormal",
        }
    }
}

/// 任务调度接口
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    /// 任务入队：写入任务、队列项和统计记录，三者共享任务 id
    async fn enqueue(&self, task: Task, actor: ActorId) -> OrchestratorResult<Task>;

    /// 取消任务
    ///
    /// 无法送达的取消（节点缺失、Worker未连接）不会作为错误返回，而是把任务
    /// 标记为 abnormal 并返回持久化结果。
    async fn cancel(
        &self,
        task_id: i64,
        actor: ActorId,
        force: bool,
    ) -> OrchestratorResult<CancelOutcome>;

    /// 任务状态的唯一写入口：id 为 0 时插入，否则按 id 整体替换
    async fn save_task(&self, task: Task, actor: ActorId) -> OrchestratorResult<Task>;

    fn set_interval(&self, interval: Duration);

    fn interval(&self) -> Duration;
}

/// 调度服务实现
pub struct TaskSchedulerService {
    task_repo: Arc<dyn TaskRepository>,
    queue_repo: Arc<dyn QueueItemRepository>,
    stat_repo: Arc<dyn StatRepository>,
    node_repo: Arc<dyn NodeRepository>,
    local_handler: Arc<dyn LocalTaskHandler>,
    stream_registry: Arc<dyn StreamRegistry>,
    interval_ms: AtomicU64,
}

impl TaskSchedulerService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        queue_repo: Arc<dyn QueueItemRepository>,
        stat_repo: Arc<dyn StatRepository>,
        node_repo: Arc<dyn NodeRepository>,
        local_handler: Arc<dyn LocalTaskHandler>,
        stream_registry: Arc<dyn StreamRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            task_repo,
            queue_repo,
            stat_repo,
            node_repo,
            local_handler,
            stream_registry,
            interval_ms: AtomicU64::new(duration_to_millis(interval)),
        }
    }

    /// 入队中途失败时撤销已写入的记录
    async fn rollback_enqueue(&self, task_id: i64, queue_item_written: bool) {
        if queue_item_written {
            if let Err(e) = self.queue_repo.delete(task_id).await {
                error!("回滚任务 {} 的队列项失败: {}", task_id, e);
            }
        }
        if let Err(e) = self.task_repo.delete(task_id).await {
            error!("回滚任务 {} 失败: {}", task_id, e);
        }
    }

    /// 把无法取消的原因记录到任务上
    async fn mark_abnormal(
        &self,
        mut task: Task,
        actor: ActorId,
        cause: OrchestratorError,
    ) -> OrchestratorResult<CancelOutcome> {
        warn!("任务 {} 无法取消，标记为异常: {}", task.id, cause);
        task.mark_abnormal(cause.to_string());
        self.save_task(task, actor).await?;
        Ok(CancelOutcome::MarkedAbnormal)
    }

    /// 查询任务所在节点，任何失败都归为状态不一致
    async fn owning_node(&self, task: &Task) -> OrchestratorResult<Node> {
        let node_id = task.node_id.ok_or_else(|| {
            OrchestratorError::InconsistentState(format!("任务 {} 未分配节点", task.id))
        })?;

        match self.node_repo.get_by_id(node_id).await {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(OrchestratorError::InconsistentState(format!(
                "任务 {} 所在节点 {} 不存在",
                task.id, node_id
            ))),
            Err(e) => Err(OrchestratorError::InconsistentState(format!(
                "查询任务 {} 所在节点 {} 失败: {}",
                task.id, node_id, e
            ))),
        }
    }

    async fn cancel_remote(
        &self,
        task: Task,
        actor: ActorId,
        force: bool,
    ) -> OrchestratorResult<CancelOutcome> {
        let Some(stream) = self.stream_registry.lookup(task.id).await else {
            let cause = OrchestratorError::Unreachable { task_id: task.id };
            return self.mark_abnormal(task, actor, cause).await;
        };

        stream
            .send(TaskControlMessage::Cancel {
                task_id: task.id,
                force,
            })
            .await
            .map_err(|e| match e {
                OrchestratorError::TransportFailure(_) => e,
                other => OrchestratorError::TransportFailure(other.to_string()),
            })?;

        debug!("已向Worker发送任务 {} 的取消指令", task.id);
        Ok(CancelOutcome::SentToWorker)
    }
}

#[async_trait]
impl TaskScheduler for TaskSchedulerService {
    #[instrument(skip(self, task), fields(spider_id = task.spider_id))]
    async fn enqueue(&self, mut task: Task, actor: ActorId) -> OrchestratorResult<Task> {
        task.status = TaskStatus::Pending;
        task.set_created(actor);
        task.set_updated(actor);

        let task = self.task_repo.create(&task).await?;

        if let Err(e) = self
            .queue_repo
            .create(&QueueItem::for_task(&task, actor))
            .await
        {
            error!("任务 {} 写入队列失败: {}", task.id, e);
            self.rollback_enqueue(task.id, false).await;
            return Err(e);
        }

        if let Err(e) = self.stat_repo.create(&Stat::for_task(task.id, actor)).await {
            error!("任务 {} 创建统计记录失败: {}", task.id, e);
            self.rollback_enqueue(task.id, true).await;
            return Err(e);
        }

        counter!("orchestrator_tasks_enqueued_total").increment(1);
        info!("任务 {} 已入队 (priority={})", task.id, task.priority);
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn cancel(
        &self,
        task_id: i64,
        actor: ActorId,
        force: bool,
    ) -> OrchestratorResult<CancelOutcome> {
        let mut task = self
            .task_repo
            .get_by_id(task_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found(ResourceKind::Task, task_id))?;

        let outcome = if task.is_pending() {
            // 任务尚未开始，只撤掉队列项，任务状态保持 pending
            self.queue_repo.delete(task_id).await?;
            CancelOutcome::Dequeued
        } else {
            let node = match self.owning_node(&task).await {
                Ok(node) => node,
                Err(cause) => {
                    return self.record_cancel(self.mark_abnormal(task, actor, cause).await)
                }
            };

            if node.is_master {
                self.local_handler.cancel(task_id, force).await?;
                task.status = TaskStatus::Cancelled;
                self.save_task(task, actor).await?;
                CancelOutcome::CancelledLocally
            } else {
                self.cancel_remote(task, actor, force).await?
            }
        };

        self.record_cancel(Ok(outcome))
    }

    async fn save_task(&self, mut task: Task, actor: ActorId) -> OrchestratorResult<Task> {
        if task.is_new() {
            task.set_created(actor);
            task.set_updated(actor);
            return self.task_repo.create(&task).await;
        }

        task.set_updated(actor);
        self.task_repo.replace(&task).await?;
        Ok(task)
    }

    fn set_interval(&self, interval: Duration) {
        self.interval_ms
            .store(duration_to_millis(interval), Ordering::Relaxed);
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Relaxed))
    }
}

impl TaskSchedulerService {
    fn record_cancel(
        &self,
        result: OrchestratorResult<CancelOutcome>,
    ) -> OrchestratorResult<CancelOutcome> {
        if let Ok(outcome) = &result {
            counter!("orchestrator_task_cancellations_total", "route" => outcome.as_label())
                .increment(1);
        }
        result
    }
}

/// 毫秒数超出 u64 时饱和为最大值
fn duration_to_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}
