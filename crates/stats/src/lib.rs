//! 任务结果写入
//!
//! 按任务解析结果写入目标（带缓存），写入结果记录与日志，并异步累加任务结果数。

pub mod resolver;
pub mod service;
pub mod writer;

pub use resolver::{DataSinkItem, DataSinkResolver};
pub use service::TaskStatsService;
pub use writer::{normalize_record, DefaultStoreWriter, ExternalSinkWriter, ResultWriter};
