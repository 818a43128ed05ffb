use thiserror::Error;

/// 错误涉及的资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Task,
    QueueItem,
    Stat,
    Node,
    Spider,
    Sink,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Task => "任务",
            ResourceKind::QueueItem => "队列项",
            ResourceKind::Stat => "任务统计",
            ResourceKind::Node => "节点",
            ResourceKind::Spider => "爬虫",
            ResourceKind::Sink => "数据源",
        };
        f.write_str(name)
    }
}

/// 编排器错误类型定义
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("{kind}未找到: {id}")]
    NotFound { kind: ResourceKind, id: i64 },

    #[error("任务 {task_id} 的取消通道未注册，Worker不可达")]
    Unreachable { task_id: i64 },

    #[error("任务状态不一致: {0}")]
    InconsistentState(String),

    #[error("取消通道发送失败: {0}")]
    TransportFailure(String),

    #[error("持久化操作失败: {0}")]
    PersistenceFailure(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn not_found(kind: ResourceKind, id: i64) -> Self {
        OrchestratorError::NotFound { kind, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestratorError::NotFound { .. })
    }

    /// 持久化网关相关的失败（包括底层数据库错误）
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            OrchestratorError::PersistenceFailure(_) | OrchestratorError::Database(_)
        )
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        OrchestratorError::Serialization(err.to_string())
    }
}

/// 统一的Result类型
pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;
