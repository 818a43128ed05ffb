use serde::{Deserialize, Serialize};

/// 调度器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 轮询间隔（秒），保留用于向前兼容，可在运行时调整
    pub poll_interval_seconds: u64,
    /// 启动时是否执行状态恢复
    pub recovery_enabled: bool,
    /// 启动恢复时并发改写任务状态的上限
    pub recovery_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
            recovery_enabled: true,
            recovery_concurrency: 16,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("轮询间隔必须大于0"));
        }

        if self.recovery_concurrency == 0 {
            return Err(anyhow::anyhow!("恢复并发数必须大于0"));
        }

        Ok(())
    }
}

/// 保留天数上限（约一百年）
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// 历史数据清理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// 是否启用自动清理
    pub enabled: bool,
    /// 清理间隔（秒）
    pub interval_seconds: u64,
    /// 任务及统计保留天数，以统计记录创建时间计
    pub retention_days: i64,
    /// 每次批量删除的最大 id 数
    pub max_batch_size: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 1800, // 30分钟
            retention_days: 30,
            max_batch_size: 1000,
        }
    }
}

impl CleanupConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval_seconds == 0 {
            return Err(anyhow::anyhow!("清理间隔必须大于0"));
        }

        if self.retention_days <= 0 {
            return Err(anyhow::anyhow!("保留天数必须大于0"));
        }

        if self.retention_days > MAX_RETENTION_DAYS {
            return Err(anyhow::anyhow!(
                "保留天数不能超过 {} 天",
                MAX_RETENTION_DAYS
            ));
        }

        if self.max_batch_size == 0 {
            return Err(anyhow::anyhow!("批量删除大小必须大于0"));
        }

        Ok(())
    }
}
