//! Test data builders for creating test entities
//!
//! Builders start from sensible defaults so tests only spell out the fields
//! they care about.

use chrono::{Duration, Utc};
use orchestrator_core::models::{Audit, Record, Spider, Stat, Task, TaskStatus, SYSTEM_ACTOR};

/// Builder for creating test Task entities
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new() -> Self {
        let mut task = Task::new(1);
        task.id = 1;
        Self { task }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_spider(mut self, spider_id: i64) -> Self {
        self.task.spider_id = spider_id;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn with_node(mut self, node_id: i64) -> Self {
        self.task.node_id = Some(node_id);
        self
    }

    pub fn without_node(mut self) -> Self {
        self.task.node_id = None;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.task.error = Some(error.to_string());
        self
    }

    pub fn running(self) -> Self {
        self.with_status(TaskStatus::Running)
    }

    pub fn build(self) -> Task {
        self.task
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Spider entities
pub struct SpiderBuilder {
    spider: Spider,
}

impl SpiderBuilder {
    pub fn new() -> Self {
        Self {
            spider: Spider {
                id: 1,
                name: "test_spider".to_string(),
                col_name: "results_test_spider".to_string(),
                data_source_id: None,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.spider.id = id;
        self
    }

    pub fn with_col_name(mut self, col_name: &str) -> Self {
        self.spider.col_name = col_name.to_string();
        self
    }

    pub fn with_data_source(mut self, data_source_id: i64) -> Self {
        self.spider.data_source_id = Some(data_source_id);
        self
    }

    pub fn build(self) -> Spider {
        self.spider
    }
}

impl Default for SpiderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Stat entities
pub struct StatBuilder {
    stat: Stat,
}

impl StatBuilder {
    pub fn new(task_id: i64) -> Self {
        Self {
            stat: Stat::for_task(task_id, SYSTEM_ACTOR),
        }
    }

    pub fn with_result_count(mut self, count: i64) -> Self {
        self.stat.result_count = count;
        self
    }

    /// Backdate the creation timestamp, the retention clock
    pub fn created_days_ago(mut self, days: i64) -> Self {
        let created_at = Utc::now() - Duration::days(days);
        self.stat.audit = Audit {
            created_at,
            updated_at: created_at,
            ..self.stat.audit
        };
        self
    }

    pub fn build(self) -> Stat {
        self.stat
    }
}

/// Build a result record from a JSON object literal
///
/// Non-object values produce an empty record.
pub fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}
