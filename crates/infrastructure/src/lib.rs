//! 编排核心的基础设施适配器

pub mod cache;
pub mod database;
pub mod local_task_registry;
pub mod log_store;
pub mod stream_registry;

pub use cache::{CacheStats, TtlCache};
pub use database::*;
pub use local_task_registry::{CancelSignal, LocalTaskRegistry};
pub use log_store::FileLogStore;
pub use stream_registry::{ChannelTaskStream, InProcessStreamRegistry};
