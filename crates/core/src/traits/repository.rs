//! 持久化网关接口定义
//!
//! 编排核心通过这些接口访问文档存储，不包含任何业务逻辑：
//! - 任务仓储接口 (TaskRepository)
//! - 队列项仓储接口 (QueueItemRepository)
//! - 任务统计仓储接口 (StatRepository)
//! - 节点仓储接口 (NodeRepository)
//! - 爬虫仓储接口 (SpiderRepository)
//! - 默认结果文档存储 (DocumentStore)
//!
//! ## 设计原则
//!
//! 单条查询返回 `Option`，"不存在"由调用方决定是否转换为
//! [`OrchestratorError::NotFound`](crate::OrchestratorError::NotFound)。
//! 批量删除接受 id 集合（"字段 in 集合"），过期查询接受时间戳（"字段小于时间戳"）。
//!
//! ## 使用示例
//!
//! ```rust
//! use orchestrator_core::traits::TaskRepository;
//! use orchestrator_core::models::{Task, TaskStatus};
//! use orchestrator_core::OrchestratorResult;
//!
//! async fn stale_tasks(repo: &dyn TaskRepository) -> OrchestratorResult<Vec<Task>> {
//!     repo.get_by_statuses(&[TaskStatus::Pending, TaskStatus::Running]).await
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Node, QueueItem, Record, Spider, Stat, Task, TaskStatus};
use crate::OrchestratorResult;

/// 任务仓储接口
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 插入任务并返回带生成 id 的副本
    async fn create(&self, task: &Task) -> OrchestratorResult<Task>;

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Task>>;

    /// 按 id 整体替换，任务不存在时返回 NotFound
    async fn replace(&self, task: &Task) -> OrchestratorResult<()>;

    async fn delete(&self, id: i64) -> OrchestratorResult<()>;

    /// 查询状态属于给定集合的任务
    async fn get_by_statuses(&self, statuses: &[TaskStatus]) -> OrchestratorResult<Vec<Task>>;

    /// 批量删除，返回删除条数
    async fn delete_by_ids(&self, ids: &[i64]) -> OrchestratorResult<u64>;
}

/// 队列项仓储接口
#[async_trait]
pub trait QueueItemRepository: Send + Sync {
    async fn create(&self, item: &QueueItem) -> OrchestratorResult<()>;

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<QueueItem>>;

    /// 删除单个队列项，不存在时不报错
    async fn delete(&self, id: i64) -> OrchestratorResult<()>;

    /// 清空队列，返回删除条数
    async fn delete_all(&self) -> OrchestratorResult<u64>;

    async fn count(&self) -> OrchestratorResult<u64>;
}

/// 任务统计仓储接口
#[async_trait]
pub trait StatRepository: Send + Sync {
    async fn create(&self, stat: &Stat) -> OrchestratorResult<()>;

    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Stat>>;

    async fn delete(&self, id: i64) -> OrchestratorResult<()>;

    /// 查询创建时间早于 `cutoff` 的统计记录
    async fn get_created_before(&self, cutoff: DateTime<Utc>) -> OrchestratorResult<Vec<Stat>>;

    async fn delete_by_ids(&self, ids: &[i64]) -> OrchestratorResult<u64>;

    /// 原子地累加结果数
    async fn increment_result_count(&self, id: i64, delta: i64) -> OrchestratorResult<()>;
}

/// 节点仓储接口（只读）
#[async_trait]
pub trait NodeRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Node>>;
}

/// 爬虫仓储接口（只读）
#[async_trait]
pub trait SpiderRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> OrchestratorResult<Option<Spider>>;
}

/// 默认结果文档存储
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 向集合批量插入记录，整体成功或整体失败
    async fn insert_many(&self, collection: &str, records: &[Record]) -> OrchestratorResult<()>;
}
