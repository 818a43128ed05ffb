//! 外部数据源接口（授权模式）
//!
//! 授权模式下，结果可写入可插拔的外部数据库服务。数据源 id 来自爬虫配置，
//! 注册表把 id 解析为可写句柄。

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::Record;
use crate::OrchestratorResult;

/// 外部数据源的写句柄
#[async_trait]
pub trait SinkHandle: Send + Sync {
    /// 写入一行记录
    ///
    /// `schema_hint` 为空时由数据源自行推断表结构。
    async fn create_row(
        &self,
        sink_id: i64,
        schema_hint: &str,
        table_name: &str,
        record: &Record,
    ) -> OrchestratorResult<()>;
}

/// 外部数据源注册表
#[async_trait]
pub trait SinkRegistry: Send + Sync {
    async fn resolve_sink(&self, sink_id: i64) -> OrchestratorResult<Arc<dyn SinkHandle>>;
}
