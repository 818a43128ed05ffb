//! 编排器配置
//!
//! 配置按组件分节，全部字段都有默认值：
//!
//! - **database**: SQLite 持久化网关连接参数
//! - **scheduler**: 调度器轮询间隔与启动恢复并发度
//! - **cleanup**: 历史数据保留期清理
//! - **stats**: 数据源缓存与授权模式
//! - **log**: 进程日志与任务日志目录
//! - **node**: 当前节点标识
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use orchestrator_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/orchestrator.toml")).unwrap();
//! println!("保留天数: {}", config.cleanup.retention_days);
//! ```

pub mod models;

pub use models::*;
