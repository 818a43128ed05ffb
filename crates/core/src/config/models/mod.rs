pub mod app_config;
pub mod database;
pub mod logging;
pub mod node;
pub mod scheduler;
pub mod stats;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use database::DatabaseConfig;
pub use logging::{LogConfig, OutputFormat};
pub use node::NodeConfig;
pub use scheduler::{CleanupConfig, SchedulerConfig};
pub use stats::StatsConfig;
