use serde::{Deserialize, Serialize};

use super::audit::{ActorId, Audit};
use super::task::Task;

/// 任务队列项
///
/// 与任务一一对应，`id` 即任务 id。队列项存在是任务"等待执行"的唯一依据，
/// 任务被执行组件领取或在等待中被取消时删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub priority: i32,
    pub node_id: Option<i64>,
    #[serde(flatten)]
    pub audit: Audit,
}

impl QueueItem {
    /// 从已持久化的任务派生队列项，复制优先级与节点亲和性
    pub fn for_task(task: &Task, by: ActorId) -> Self {
        Self {
            id: task.id,
            priority: task.priority,
            node_id: task.node_id,
            audit: Audit::stamped(by),
        }
    }
}
