//! # 数据模型
//!
//! 编排核心读写的记录类型。
//!
//! ## 核心模型
//!
//! ### Task - 任务
//! 一次爬虫执行，携带状态、节点、优先级与错误信息。
//!
//! ### QueueItem - 队列项
//! 任务"等待执行"的标记，与任务共享 id。
//!
//! ### Stat - 任务统计
//! 累计结果数，同时是历史数据保留期清理的锚点，与任务共享 id。
//!
//! ### Node / Spider
//! 只读引用：节点决定取消走本地还是远程，爬虫决定结果写到哪里。
//!
//! ## 状态流转
//!
//! ```text
//! pending → assigned → running → finished
//!    │                    │  ↘
//!    │                    │   error
//!    ↓                    ↓
//!  (队列项删除)       cancelled / abnormal
//! ```
//!
//! 主节点重启时，`pending`/`running` 一律改写为 `abnormal`。

pub mod audit;
pub mod node;
pub mod queue_item;
pub mod record;
pub mod spider;
pub mod stat;
pub mod task;

pub use audit::*;
pub use node::*;
pub use queue_item::*;
pub use record::*;
pub use spider::*;
pub use stat::*;
pub use task::*;
