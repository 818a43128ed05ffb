//! 结果写入策略
//!
//! 授权模式与默认模式各对应一个 [`ResultWriter`] 实现，在服务构建时选定。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use orchestrator_core::{
    models::{Record, SPIDER_KEY, TASK_KEY},
    traits::DocumentStore,
    OrchestratorResult,
};

use crate::resolver::DataSinkItem;

#[async_trait]
pub trait ResultWriter: Send + Sync {
    /// 写入一批记录，返回成功写入的条数
    async fn write(&self, item: &DataSinkItem, records: Vec<Record>) -> OrchestratorResult<u64>;
}

/// 给记录打上所属任务和爬虫的标记
pub fn normalize_record(item: &DataSinkItem, record: &mut Record) {
    record.insert(TASK_KEY.to_string(), Value::from(item.task_id));
    record.insert(SPIDER_KEY.to_string(), Value::from(item.spider_id));
}

/// 默认模式：整批写入文档存储，整体成功或整体失败
pub struct DefaultStoreWriter {
    store: Arc<dyn DocumentStore>,
}

impl DefaultStoreWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResultWriter for DefaultStoreWriter {
    async fn write(&self, item: &DataSinkItem, mut records: Vec<Record>) -> OrchestratorResult<u64> {
        for record in records.iter_mut() {
            normalize_record(item, record);
        }

        self.store.insert_many(&item.table_name, &records).await?;
        Ok(records.len() as u64)
    }
}

/// 授权模式：逐条写入外部数据源，单条失败跳过
///
/// 爬虫未配置外部数据源时退回默认存储。
pub struct ExternalSinkWriter {
    fallback: DefaultStoreWriter,
}

impl ExternalSinkWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            fallback: DefaultStoreWriter::new(store),
        }
    }
}

#[async_trait]
impl ResultWriter for ExternalSinkWriter {
    async fn write(&self, item: &DataSinkItem, records: Vec<Record>) -> OrchestratorResult<u64> {
        let (Some(sink), Some(sink_id)) = (&item.sink, item.sink_id) else {
            return self.fallback.write(item, records).await;
        };

        let total = records.len();
        let mut written = 0u64;
        for mut record in records {
            normalize_record(item, &mut record);
            match sink.create_row(sink_id, "", &item.table_name, &record).await {
                Ok(()) => written += 1,
                Err(e) => warn!("任务 {} 写入外部数据源 {} 失败: {}", item.task_id, sink_id, e),
            }
        }

        debug!(
            "任务 {} 写入外部数据源 {}: {}/{}",
            item.task_id, sink_id, written, total
        );
        Ok(written)
    }
}
