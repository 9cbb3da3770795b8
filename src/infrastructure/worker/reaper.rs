//! Stale Task Reaper - 超时任务回收
//!
//! Worker 进程崩溃会留下永久 processing 的任务行。
//! Reaper 周期扫描 started_at 早于阈值的 processing 任务，
//! 重置回 pending 并重新入队。条件 UPDATE 保证不会误伤
//! 扫描期间刚完成的任务。

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::TaskStorePort;

/// Reaper 配置
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// 扫描间隔（秒）
    pub interval_secs: u64,
    /// processing 超过该时长视为失联（秒）
    pub stale_after_secs: i64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            stale_after_secs: 600,
        }
    }
}

/// 超时任务回收器
pub struct StaleTaskReaper {
    config: ReaperConfig,
    task_store: Arc<dyn TaskStorePort>,
}

impl StaleTaskReaper {
    pub fn new(config: ReaperConfig, task_store: Arc<dyn TaskStorePort>) -> Self {
        Self { config, task_store }
    }

    /// 启动周期扫描循环
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            stale_after_secs = self.config.stale_after_secs,
            "StaleTaskReaper started"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        // 启动时先跳过第一个立即触发的 tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// 执行一轮扫描
    pub async fn sweep_once(&self) {
        let threshold = Utc::now() - chrono::Duration::seconds(self.config.stale_after_secs);

        match self.task_store.requeue_stale(threshold).await {
            Ok(requeued) if !requeued.is_empty() => {
                tracing::info!(
                    count = requeued.len(),
                    task_ids = ?requeued,
                    "Requeued stale tasks"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Stale task sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NewTask;
    use crate::domain::TaskStatus;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteTaskStore,
    };
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweep_requeues_stuck_task() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let (tx, mut rx) = mpsc::channel(10);
        let store = Arc::new(SqliteTaskStore::new(pool, tx));

        let task = store
            .create(NewTask {
                account_id: Some(Uuid::new_v4()),
                text: "stuck".to_string(),
                voice_id: Uuid::new_v4(),
                estimated_secs: 60,
                credits_used: 5,
            })
            .await
            .unwrap();
        rx.try_recv().unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        // stale_after_secs 为负数：刚认领即视为超时
        let reaper = StaleTaskReaper::new(
            ReaperConfig {
                interval_secs: 60,
                stale_after_secs: -5,
            },
            store.clone(),
        );
        reaper.sweep_once().await;

        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.status, TaskStatus::Pending);
        assert_eq!(rx.try_recv().unwrap(), task.id);
    }

    #[tokio::test]
    async fn test_sweep_leaves_fresh_tasks_alone() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let (tx, _rx) = mpsc::channel(10);
        let store = Arc::new(SqliteTaskStore::new(pool, tx));

        let task = store
            .create(NewTask {
                account_id: None,
                text: "fresh".to_string(),
                voice_id: Uuid::new_v4(),
                estimated_secs: 60,
                credits_used: 0,
            })
            .await
            .unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        let reaper = StaleTaskReaper::new(ReaperConfig::default(), store.clone());
        reaper.sweep_once().await;

        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.status, TaskStatus::Processing);
    }
}
