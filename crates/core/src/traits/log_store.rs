//! 按行索引的任务日志存储接口

use async_trait::async_trait;

use crate::OrchestratorResult;

#[async_trait]
pub trait LogStore: Send + Sync {
    /// 追加若干行日志
    async fn write_lines(&self, task_id: i64, lines: &[String]) -> OrchestratorResult<()>;

    /// 按顺序读取包含 `pattern` 的日志行，跳过前 `skip` 条，最多返回 `limit` 条
    async fn find(
        &self,
        task_id: i64,
        pattern: &str,
        skip: usize,
        limit: usize,
    ) -> OrchestratorResult<Vec<String>>;
}
