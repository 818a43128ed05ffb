//! 进程内取消通道注册表
//!
//! Worker连接建立后以任务 id 注册，拿到接收端后转发给远端；连接断开时注销。
//! 调度器只通过 [`StreamRegistry::lookup`] 和 [`TaskStream::send`] 使用它。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_core::{
    traits::{StreamRegistry, TaskControlMessage, TaskStream},
    OrchestratorError, OrchestratorResult,
};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

const STREAM_BUFFER_SIZE: usize = 16;

/// 单个任务的下行通道
pub struct ChannelTaskStream {
    task_id: i64,
    sender: mpsc::Sender<TaskControlMessage>,
}

#[async_trait]
impl TaskStream for ChannelTaskStream {
    async fn send(&self, message: TaskControlMessage) -> OrchestratorResult<()> {
        // 不等待缓冲区腾出空间，投递失败立即返回
        self.sender.try_send(message).map_err(|e| {
            OrchestratorError::TransportFailure(format!("任务 {} 的通道不可用: {e}", self.task_id))
        })
    }
}

#[derive(Default)]
pub struct InProcessStreamRegistry {
    streams: RwLock<HashMap<i64, Arc<ChannelTaskStream>>>,
}

impl InProcessStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为任务注册通道，重复注册会替换旧通道
    pub async fn register(&self, task_id: i64) -> mpsc::Receiver<TaskControlMessage> {
        let (sender, receiver) = mpsc::channel(STREAM_BUFFER_SIZE);
        let stream = Arc::new(ChannelTaskStream { task_id, sender });
        self.streams.write().await.insert(task_id, stream);
        debug!("注册任务通道: {}", task_id);
        receiver
    }

    pub async fn deregister(&self, task_id: i64) -> bool {
        let removed = self.streams.write().await.remove(&task_id).is_some();
        if removed {
            debug!("注销任务通道: {}", task_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.streams.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.streams.read().await.is_empty()
    }
}

#[async_trait]
impl StreamRegistry for InProcessStreamRegistry {
    async fn lookup(&self, task_id: i64) -> Option<Arc<dyn TaskStream>> {
        self.streams
            .read()
            .await
            .get(&task_id)
            .map(|stream| stream.clone() as Arc<dyn TaskStream>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_and_send() {
        let registry = InProcessStreamRegistry::new();
        let mut receiver = registry.register(5).await;

        let stream = registry.lookup(5).await.unwrap();
        stream
            .send(TaskControlMessage::Cancel {
                task_id: 5,
                force: true,
            })
            .await
            .unwrap();

        assert_eq!(
            receiver.recv().await,
            Some(TaskControlMessage::Cancel {
                task_id: 5,
                force: true
            })
        );
    }

    #[tokio::test]
    async fn test_lookup_unregistered() {
        let registry = InProcessStreamRegistry::new();
        assert!(registry.lookup(1).await.is_none());

        let _receiver = registry.register(1).await;
        assert!(registry.deregister(1).await);
        assert!(!registry.deregister(1).await);
        assert!(registry.lookup(1).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let registry = InProcessStreamRegistry::new();
        let receiver = registry.register(9).await;
        drop(receiver);

        let stream = registry.lookup(9).await.unwrap();
        let err = stream
            .send(TaskControlMessage::Cancel {
                task_id: 9,
                force: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::TransportFailure(_)));
    }
}
