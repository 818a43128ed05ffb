//! 任务编排调度
//!
//! - [`scheduler`]：入队、取消、状态写入
//! - [`recovery_service`]：主节点启动时的任务状态重置
//! - [`cleanup_service`]：历史任务保留期清理

pub mod cleanup_service;
pub mod recovery_service;
pub mod scheduler;

pub use cleanup_service::{CleanupService, CleanupStats};
pub use recovery_service::{RecoveryReport, RecoveryService, TaskRecoveryService};
pub use scheduler::{CancelOutcome, TaskScheduler, TaskSchedulerService};
