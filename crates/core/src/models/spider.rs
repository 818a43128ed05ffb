use serde::{Deserialize, Serialize};

/// 爬虫定义中与结果写入相关的部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spider {
    pub id: i64,
    pub name: String,
    /// 结果集合/表名
    pub col_name: String,
    /// 外部数据源 id，未配置时写入默认文档存储
    pub data_source_id: Option<i64>,
}
