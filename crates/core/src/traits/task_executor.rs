//! 本地任务执行组件接口
//!
//! 主节点自身也执行任务。取消一个在主节点上运行的任务时，调度器直接调用
//! 本地执行组件，而不经过取消通道。

use async_trait::async_trait;

use crate::OrchestratorResult;

/// 主节点本地执行组件
#[async_trait]
pub trait LocalTaskHandler: Send + Sync {
    /// 取消本地运行的任务
    ///
    /// `force` 为 true 时执行组件应立即终止进程，而不是等待优雅退出。
    /// 实现应当快速返回；失败时调度器不会修改任务状态，调用方可重试。
    async fn cancel(&self, task_id: i64, force: bool) -> OrchestratorResult<()>;
}
