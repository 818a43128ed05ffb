use serde::{Deserialize, Serialize};

use super::audit::{ActorId, Audit};

/// 任务定义
///
/// 一次可调度的爬虫执行单元。状态迁移由调度器负责，进度与完成状态
/// 由外部执行组件通过 `save_task` 回写。
///
/// # 字段说明
///
/// - `id`: 任务唯一标识，`0` 表示尚未持久化
/// - `spider_id`: 所属爬虫，用于解析结果写入位置
/// - `status`: 任务状态
/// - `node_id`: 执行该任务的节点，未分配时为 `None`
/// - `priority`: 优先级，入队时复制到队列项
/// - `error`: 异常或失败原因
/// - `audit`: 创建/更新审计信息
///
/// # 使用示例
///
/// ```rust
/// use orchestrator_core::models::{Task, TaskStatus};
///
/// let task = Task::new(42).with_priority(5).with_node(3);
/// assert_eq!(task.status, TaskStatus::Pending);
/// assert!(task.is_new());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub spider_id: i64,
    pub status: TaskStatus,
    pub node_id: Option<i64>,
    pub priority: i32,
    pub error: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

/// 任务状态
///
/// `Assigned`/`Running`/`Finished`/`Error` 由执行组件上报，调度器只在
/// 入队、取消、恢复时写入 `Pending`/`Cancelled`/`Abnormal`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Assigned,
    Running,
    Finished,
    Error,
    Cancelled,
    Abnormal,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Running => "running",
            TaskStatus::Finished => "finished",
            TaskStatus::Error => "error",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Abnormal => "abnormal",
        }
    }

    /// 主节点重启后无法延续的状态
    pub fn is_volatile(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "assigned" => Ok(TaskStatus::Assigned),
            "running" => Ok(TaskStatus::Running),
            "finished" => Ok(TaskStatus::Finished),
            "error" => Ok(TaskStatus::Error),
            "cancelled" => Ok(TaskStatus::Cancelled),
            "abnormal" => Ok(TaskStatus::Abnormal),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for TaskStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        s.parse::<TaskStatus>().map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

impl Task {
    /// 创建新任务，id 由持久化层生成
    pub fn new(spider_id: i64) -> Self {
        Self {
            id: 0,
            spider_id,
            status: TaskStatus::Pending,
            node_id: None,
            priority: 5,
            error: None,
            audit: Audit::default(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_node(mut self, node_id: i64) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// 尚未持久化
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// 标记为异常并记录原因
    pub fn mark_abnormal(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Abnormal;
        self.error = Some(reason.into());
    }

    pub fn set_created(&mut self, by: ActorId) {
        self.audit.set_created(by);
    }

    pub fn set_updated(&mut self, by: ActorId) {
        self.audit.set_updated(by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Cancelled,
            TaskStatus::Abnormal,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Abnormal).unwrap();
        assert_eq!(json, "\"abnormal\"");
    }

    #[test]
    fn test_volatile_statuses() {
        assert!(TaskStatus::Pending.is_volatile());
        assert!(TaskStatus::Running.is_volatile());
        assert!(!TaskStatus::Finished.is_volatile());
        assert!(!TaskStatus::Abnormal.is_volatile());
    }

    #[test]
    fn test_mark_abnormal() {
        let mut task = Task::new(1).with_status(TaskStatus::Running);
        task.mark_abnormal("node missing");
        assert_eq!(task.status, TaskStatus::Abnormal);
        assert_eq!(task.error.as_deref(), Some("node missing"));
    }
}
