use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use orchestrator_core::{
    config::CleanupConfig,
    traits::{StatRepository, TaskRepository},
    OrchestratorError, OrchestratorResult,
};

/// 历史数据清理服务
///
/// 按统计记录的创建时间清理过期的任务及其统计，防止数据库无限增长。
/// 队列项生命周期很短，不在清理范围内。
pub struct CleanupService {
    task_repo: Arc<dyn TaskRepository>,
    stat_repo: Arc<dyn StatRepository>,
    config: CleanupConfig,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CleanupService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        stat_repo: Arc<dyn StatRepository>,
        config: CleanupConfig,
    ) -> Self {
        Self {
            task_repo,
            stat_repo,
            config,
            shutdown_tx: None,
            cleanup_handle: None,
        }
    }

    /// 启动清理服务
    pub fn start(&mut self) {
        if !self.config.enabled {
            info!("Cleanup service is disabled");
            return;
        }
        if self.cleanup_handle.is_some() {
            warn!("Cleanup service already running");
            return;
        }

        info!("Starting cleanup service with config: {:?}", self.config);

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let task_repo = self.task_repo.clone();
        let stat_repo = self.stat_repo.clone();
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            let mut cleanup_interval = interval(StdDuration::from_secs(config.interval_seconds));

            loop {
                tokio::select! {
                    _ = cleanup_interval.tick() => {
                        // 单次失败不终止循环，等待下一个周期
                        if let Err(e) = Self::perform_cleanup(&task_repo, &stat_repo, &config).await {
                            error!("Cleanup failed: {}", e);
                        }
                    }
                    _ = &mut shutdown_rx => {
                        info!("Cleanup service shutdown requested");
                        break;
                    }
                }
            }
        });

        self.cleanup_handle = Some(handle);
    }

    /// 停止清理服务
    pub async fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = self.cleanup_handle.take() {
            if let Err(e) = handle.await {
                warn!("Error waiting for cleanup service to stop: {}", e);
            }
        }

        info!("Cleanup service stopped");
    }

    pub fn is_running(&self) -> bool {
        self.cleanup_handle.is_some()
    }

    /// 执行一次清理操作
    pub async fn cleanup_once(&self) -> OrchestratorResult<CleanupStats> {
        Self::perform_cleanup(&self.task_repo, &self.stat_repo, &self.config).await
    }

    async fn perform_cleanup(
        task_repo: &Arc<dyn TaskRepository>,
        stat_repo: &Arc<dyn StatRepository>,
        config: &CleanupConfig,
    ) -> OrchestratorResult<CleanupStats> {
        let start_time = std::time::Instant::now();
        let mut stats = CleanupStats::default();

        let cutoff = retention_cutoff(Utc::now(), config.retention_days)?;
        let expired = stat_repo.get_created_before(cutoff).await?;
        if expired.is_empty() {
            debug!("No task history older than {}", cutoff);
            return Ok(stats);
        }

        let ids: Vec<i64> = expired.iter().map(|stat| stat.id).collect();
        stats.expired_found = ids.len();

        for chunk in ids.chunks(config.max_batch_size.max(1)) {
            match task_repo.delete_by_ids(chunk).await {
                Ok(deleted) => stats.tasks_deleted += deleted,
                Err(e) => {
                    error!("删除过期任务失败 ({} 个): {}", chunk.len(), e);
                    stats.errors += 1;
                }
            }

            match stat_repo.delete_by_ids(chunk).await {
                Ok(deleted) => stats.stats_deleted += deleted,
                Err(e) => {
                    error!("删除过期任务统计失败 ({} 个): {}", chunk.len(), e);
                    stats.errors += 1;
                }
            }
        }

        stats.duration = start_time.elapsed();
        counter!("orchestrator_retention_tasks_deleted_total").increment(stats.tasks_deleted);

        info!(
            "Cleanup completed in {:?}: {} expired, {} tasks and {} stats deleted, {} errors",
            stats.duration, stats.expired_found, stats.tasks_deleted, stats.stats_deleted, stats.errors
        );

        Ok(stats)
    }
}

/// 计算保留期截止时间，超出时间范围时返回配置错误
fn retention_cutoff(
    now: DateTime<Utc>,
    retention_days: i64,
) -> OrchestratorResult<DateTime<Utc>> {
    Duration::try_days(retention_days)
        .and_then(|retention| now.checked_sub_signed(retention))
        .ok_or_else(|| {
            OrchestratorError::Configuration(format!("保留天数超出时间范围: {retention_days}"))
        })
}

/// 清理统计信息
#[derive(Debug, Default)]
pub struct CleanupStats {
    /// 超过保留期的统计记录数
    pub expired_found: usize,
    pub tasks_deleted: u64,
    pub stats_deleted: u64,
    /// 失败的批量删除次数
    pub errors: usize,
    pub duration: StdDuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_cutoff() {
        let now = Utc::now();
        assert_eq!(retention_cutoff(now, 30).unwrap(), now - Duration::days(30));
        assert!(retention_cutoff(now, 200_000_000).is_err());
        assert!(retention_cutoff(now, i64::MAX).is_err());
    }
}
