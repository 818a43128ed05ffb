//! 文件日志存储
//!
//! 每个任务一个目录，日志追加写入 `<root>/<task_id>/log.txt`，每行一条。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use orchestrator_core::{traits::LogStore, OrchestratorResult};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const LOG_FILE_NAME: &str = "log.txt";

pub struct FileLogStore {
    root: PathBuf,
}

impl FileLogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_path(&self, task_id: i64) -> PathBuf {
        self.root.join(task_id.to_string()).join(LOG_FILE_NAME)
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn write_lines(&self, task_id: i64, lines: &[String]) -> OrchestratorResult<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let path = self.log_path(task_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut buffer = String::new();
        for line in lines {
            // 单条日志内的换行会破坏行索引
            buffer.push_str(&line.replace(['\r', '\n'], " "));
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        debug!("任务 {} 写入 {} 行日志", task_id, lines.len());
        Ok(())
    }

    async fn find(
        &self,
        task_id: i64,
        pattern: &str,
        skip: usize,
        limit: usize,
    ) -> OrchestratorResult<Vec<String>> {
        let content = match fs::read_to_string(self.log_path(task_id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter(|line| pattern.is_empty() || line.contains(pattern))
            .skip(skip)
            .take(limit)
            .map(str::to_string)
            .collect())
    }
}
