//! # Orchestrator Core
//!
//! 任务编排控制面的共享基础：错误类型、记录模型、外部协作方接口和配置。
//! 调度、恢复、清理与结果写入的实现分别位于 dispatcher 和 stats crate。

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use errors::*;
