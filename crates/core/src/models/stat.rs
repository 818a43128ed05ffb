use serde::{Deserialize, Serialize};

use super::audit::{ActorId, Audit};

/// 任务统计
///
/// `id` 即任务 id。`audit.created_at` 同时作为历史数据保留期的计时起点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub id: i64,
    pub result_count: i64,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Stat {
    pub fn for_task(task_id: i64, by: ActorId) -> Self {
        Self {
            id: task_id,
            result_count: 0,
            audit: Audit::stamped(by),
        }
    }
}
