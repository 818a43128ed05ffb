use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 操作者标识
pub type ActorId = i64;

/// 系统自身发起的写入（恢复、清理等）使用的操作者
pub const SYSTEM_ACTOR: ActorId = 0;

/// 创建/更新审计字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_by: ActorId,
    pub updated_at: DateTime<Utc>,
}

impl Default for Audit {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_by: SYSTEM_ACTOR,
            created_at: now,
            updated_by: SYSTEM_ACTOR,
            updated_at: now,
        }
    }
}

impl Audit {
    pub fn set_created(&mut self, by: ActorId) {
        self.created_by = by;
        self.created_at = Utc::now();
    }

    pub fn set_updated(&mut self, by: ActorId) {
        self.updated_by = by;
        self.updated_at = Utc::now();
    }

    /// 同时刷新创建和更新字段
    pub fn stamped(by: ActorId) -> Self {
        let mut audit = Self::default();
        audit.set_created(by);
        audit.set_updated(by);
        audit
    }
}
