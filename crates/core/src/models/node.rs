use serde::{Deserialize, Serialize};

/// 集群节点信息
///
/// 集群中恰有一个主节点，其余为Worker。编排核心只读取 `is_master`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub is_master: bool,
}

impl Node {
    pub fn master(id: i64, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id,
            name: key.clone(),
            key,
            is_master: true,
        }
    }

    pub fn worker(id: i64, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id,
            name: key.clone(),
            key,
            is_master: false,
        }
    }
}
