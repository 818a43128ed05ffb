//! 取消通道接口
//!
//! Worker领取任务后与主节点建立长连接，并以任务 id 订阅。传输层维护
//! "任务 id → 通道" 的注册表，注册和注销归传输层所有。调度器只使用两个操作：
//! `lookup(task_id)` 和 `send(message)`。
//!
//! 通道上没有应答：Worker取消任务后，经由正常的状态上报路径回写终态。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::OrchestratorResult;

/// 主节点下发给Worker的控制消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskControlMessage {
    Cancel { task_id: i64, force: bool },
}

impl TaskControlMessage {
    pub fn task_id(&self) -> i64 {
        match self {
            TaskControlMessage::Cancel { task_id, .. } => *task_id,
        }
    }
}

/// 单个Worker连接上的下行通道
#[async_trait]
pub trait TaskStream: Send + Sync {
    /// 尽力投递一条消息，不等待Worker应答
    async fn send(&self, message: TaskControlMessage) -> OrchestratorResult<()>;
}

/// 任务 id 到下行通道的注册表
#[async_trait]
pub trait StreamRegistry: Send + Sync {
    async fn lookup(&self, task_id: i64) -> Option<Arc<dyn TaskStream>>;
}
