use serde::{Deserialize, Serialize};

/// 结果写入与数据源缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// 数据源缓存项存活时间（秒）
    pub cache_ttl_seconds: u64,
    /// 缓存清扫间隔（秒）
    pub cache_sweep_interval_seconds: u64,
    /// 授权模式：允许写入外部数据源
    pub licensed: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 600,
            cache_sweep_interval_seconds: 600,
            licensed: false,
        }
    }
}

impl StatsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("缓存存活时间必须大于0"));
        }

        if self.cache_sweep_interval_seconds == 0 {
            return Err(anyhow::anyhow!("缓存清扫间隔必须大于0"));
        }

        Ok(())
    }
}
