//! 主节点本地运行任务的取消信号
//!
//! 本地执行组件启动任务时注册并持有接收端，收到信号后自行终止进程。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use orchestrator_core::{
    traits::LocalTaskHandler, OrchestratorError, OrchestratorResult, ResourceKind,
};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelSignal {
    pub force: bool,
}

#[derive(Default)]
pub struct LocalTaskRegistry {
    tasks: Mutex<HashMap<i64, watch::Sender<Option<CancelSignal>>>>,
}

impl LocalTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, watch::Sender<Option<CancelSignal>>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, task_id: i64) -> watch::Receiver<Option<CancelSignal>> {
        let (sender, receiver) = watch::channel(None);
        self.lock().insert(task_id, sender);
        receiver
    }

    pub fn deregister(&self, task_id: i64) -> bool {
        self.lock().remove(&task_id).is_some()
    }

    pub fn is_running(&self, task_id: i64) -> bool {
        self.lock().contains_key(&task_id)
    }
}

#[async_trait]
impl LocalTaskHandler for LocalTaskRegistry {
    async fn cancel(&self, task_id: i64, force: bool) -> OrchestratorResult<()> {
        let tasks = self.lock();
        let sender = tasks
            .get(&task_id)
            .ok_or_else(|| OrchestratorError::not_found(ResourceKind::Task, task_id))?;

        // 接收端已释放说明任务已经退出，重复取消视为成功
        sender.send_replace(Some(CancelSignal { force }));
        info!("已向本地任务 {} 发送取消信号 (force={})", task_id, force);
        Ok(())
    }
}
