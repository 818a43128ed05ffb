/// 单条结果记录
pub type Record = serde_json::Map<String, serde_json::Value>;

/// 结果记录中标记所属任务的字段
pub const TASK_KEY: &str = "_tid";

/// 结果记录中标记所属爬虫的字段
pub const SPIDER_KEY: &str = "_sid";
