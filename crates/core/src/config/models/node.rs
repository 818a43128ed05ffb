use serde::{Deserialize, Serialize};

/// 当前进程所在节点的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub key: String,
    pub is_master: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let key = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());
        Self {
            key,
            is_master: true,
        }
    }
}

impl NodeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.key.is_empty() {
            return Err(anyhow::anyhow!("节点标识不能为空"));
        }
        Ok(())
    }
}
