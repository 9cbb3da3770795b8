//! SQLite Task Store
//!
//! 状态迁移全部通过条件 UPDATE（WHERE status = ...）实现：
//! 命中行数为 0 即迁移被拒绝，claim 的互斥、终止状态的不可变性
//! 都由此保证，无需额外锁。
//!
//! 任务行是唯一的持久队列；mpsc 通道只是派发优化，进程重启后
//! 通过 enqueue_pending 从 pending 行恢复。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    CompletedTask, GenerationTask, NewTask, TaskError, TaskStorePort,
};
use crate::domain::{clamp_progress, TaskStatus};

/// claim 时写入的初始进度
const CLAIM_PROGRESS: u8 = 0;

/// SQLite Task Store
pub struct SqliteTaskStore {
    pool: DbPool,
    /// 任务派发通道（worker 消费端持有 Receiver）
    queue_sender: mpsc::Sender<Uuid>,
}

impl SqliteTaskStore {
    pub fn new(pool: DbPool, queue_sender: mpsc::Sender<Uuid>) -> Self {
        Self { pool, queue_sender }
    }

    fn enqueue(&self, task_id: Uuid) {
        // 队列满或 worker 未启动时只告警：行已持久化，
        // 重启恢复 / reaper 会重新派发
        if let Err(e) = self.queue_sender.try_send(task_id) {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to enqueue task");
        }
    }

    async fn fetch(&self, task_id: Uuid) -> Result<Option<GenerationTask>, TaskError> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, text, voice_id, status, progress, estimated_secs,
                   credits_used, audio_path, file_size, duration_ms, error_message,
                   created_at, started_at, completed_at
            FROM generation_tasks WHERE id = ?
            "#,
        )
        .bind(task_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        row.map(GenerationTask::try_from).transpose()
    }

    async fn fetch_required(&self, task_id: Uuid) -> Result<GenerationTask, TaskError> {
        self.fetch(task_id).await?.ok_or(TaskError::NotFound(task_id))
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: String,
    account_id: Option<String>,
    text: String,
    voice_id: String,
    status: String,
    progress: i64,
    estimated_secs: i64,
    credits_used: i64,
    audio_path: Option<String>,
    file_size: i64,
    duration_ms: Option<i64>,
    error_message: Option<String>,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
}

impl TryFrom<TaskRow> for GenerationTask {
    type Error = TaskError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(GenerationTask {
            id: parse_uuid(&row.id)?,
            account_id: row.account_id.as_deref().map(parse_uuid).transpose()?,
            text: row.text,
            voice_id: parse_uuid(&row.voice_id)?,
            status: TaskStatus::from_str(&row.status)
                .ok_or_else(|| TaskError::StorageError(format!("Unknown status: {}", row.status)))?,
            progress: row.progress.clamp(0, 100) as u8,
            estimated_secs: row.estimated_secs,
            credits_used: row.credits_used,
            audio_path: row.audio_path,
            file_size: row.file_size,
            duration_ms: row.duration_ms,
            error_message: row.error_message,
            created_at: parse_timestamp(&row.created_at)?,
            started_at: row.started_at.as_deref().map(parse_timestamp).transpose()?,
            completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, TaskError> {
    Uuid::parse_str(s).map_err(|e| TaskError::StorageError(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TaskError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TaskError::StorageError(e.to_string()))
}

#[async_trait]
impl TaskStorePort for SqliteTaskStore {
    async fn create(&self, new_task: NewTask) -> Result<GenerationTask, TaskError> {
        let task = GenerationTask {
            id: Uuid::new_v4(),
            account_id: new_task.account_id,
            text: new_task.text,
            voice_id: new_task.voice_id,
            status: TaskStatus::Pending,
            progress: 0,
            estimated_secs: new_task.estimated_secs,
            credits_used: new_task.credits_used,
            audio_path: None,
            file_size: 0,
            duration_ms: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO generation_tasks
                (id, account_id, text, voice_id, status, progress, estimated_secs,
                 credits_used, file_size, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(task.account_id.map(|id| id.to_string()))
        .bind(&task.text)
        .bind(task.voice_id.to_string())
        .bind(task.status.as_str())
        .bind(task.progress as i64)
        .bind(task.estimated_secs)
        .bind(task.credits_used)
        .bind(task.file_size)
        .bind(task.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        self.enqueue(task.id);

        Ok(task)
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<GenerationTask>, TaskError> {
        self.fetch(task_id).await
    }

    async fn claim_for_processing(&self, task_id: Uuid) -> Result<GenerationTask, TaskError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_tasks
            SET status = 'processing', started_at = ?, progress = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(CLAIM_PROGRESS as i64)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            // 认领失败：另一个 worker 已抢到，或任务已终止
            let task = self.fetch_required(task_id).await?;
            return Err(TaskError::AlreadyClaimed {
                task_id,
                status: task.status.as_str().to_string(),
            });
        }

        self.fetch_required(task_id).await
    }

    async fn update_progress(&self, task_id: Uuid, percent: u8) -> Result<(), TaskError> {
        let percent = clamp_progress(percent);

        let result = sqlx::query(
            "UPDATE generation_tasks SET progress = ? WHERE id = ? AND status = 'processing'",
        )
        .bind(percent as i64)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            let task = self.fetch_required(task_id).await?;
            tracing::warn!(
                task_id = %task_id,
                status = task.status.as_str(),
                "Progress update rejected: task not processing"
            );
            return Err(TaskError::InvalidTransition {
                task_id,
                detail: format!("cannot update progress in status {}", task.status.as_str()),
            });
        }

        Ok(())
    }

    async fn complete(
        &self,
        task_id: Uuid,
        audio_path: &str,
        file_size: i64,
        duration_ms: Option<i64>,
    ) -> Result<CompletedTask, TaskError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_tasks
            SET status = 'completed', progress = 100, audio_path = ?,
                file_size = ?, duration_ms = ?, completed_at = ?
            WHERE id = ? AND status = 'processing'
            "#,
        )
        .bind(audio_path)
        .bind(file_size)
        .bind(duration_ms)
        .bind(Utc::now().to_rfc3339())
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        if result.rows_affected() == 1 {
            let task = self.fetch_required(task_id).await?;
            return Ok(CompletedTask {
                task,
                already_completed: false,
            });
        }

        let task = self.fetch_required(task_id).await?;
        match task.status {
            // 幂等：崩溃后的重试会再次走到这里，返回现有行，不再扣费
            TaskStatus::Completed => Ok(CompletedTask {
                task,
                already_completed: true,
            }),
            status => {
                tracing::warn!(
                    task_id = %task_id,
                    status = status.as_str(),
                    "Complete rejected: task not processing"
                );
                Err(TaskError::InvalidTransition {
                    task_id,
                    detail: format!("cannot complete from status {}", status.as_str()),
                })
            }
        }
    }

    async fn fail(&self, task_id: Uuid, error: &str) -> Result<GenerationTask, TaskError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_tasks
            SET status = 'failed', error_message = ?, completed_at = ?
            WHERE id = ? AND status = 'processing'
            "#,
        )
        .bind(error)
        .bind(Utc::now().to_rfc3339())
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            let task = self.fetch_required(task_id).await?;
            tracing::warn!(
                task_id = %task_id,
                status = task.status.as_str(),
                "Fail rejected: task not processing"
            );
            return Err(TaskError::InvalidTransition {
                task_id,
                detail: format!("cannot fail from status {}", task.status.as_str()),
            });
        }

        self.fetch_required(task_id).await
    }

    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<GenerationTask>, TaskError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, text, voice_id, status, progress, estimated_secs,
                   credits_used, audio_path, file_size, duration_ms, error_message,
                   created_at, started_at, completed_at
            FROM generation_tasks WHERE account_id = ? ORDER BY created_at DESC
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        rows.into_iter().map(GenerationTask::try_from).collect()
    }

    async fn count_pending_before(&self, created_at: DateTime<Utc>) -> Result<i64, TaskError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM generation_tasks WHERE status = 'pending' AND created_at < ?",
        )
        .bind(created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))
    }

    async fn count_processing(&self) -> Result<i64, TaskError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM generation_tasks WHERE status = 'processing'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TaskError::StorageError(e.to_string()))
    }

    async fn requeue_stale(&self, stale_before: DateTime<Utc>) -> Result<Vec<Uuid>, TaskError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM generation_tasks WHERE status = 'processing' AND started_at < ?",
        )
        .bind(stale_before.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        let mut requeued = Vec::with_capacity(ids.len());

        for id in ids {
            let task_id = parse_uuid(&id)?;

            // 条件 UPDATE：worker 在查询后刚好完成的任务不会被重置
            let result = sqlx::query(
                r#"
                UPDATE generation_tasks
                SET status = 'pending', progress = 0, started_at = NULL
                WHERE id = ? AND status = 'processing' AND started_at < ?
                "#,
            )
            .bind(&id)
            .bind(stale_before.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| TaskError::StorageError(e.to_string()))?;

            if result.rows_affected() == 1 {
                self.enqueue(task_id);
                requeued.push(task_id);
            }
        }

        Ok(requeued)
    }

    async fn enqueue_pending(&self) -> Result<usize, TaskError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM generation_tasks WHERE status = 'pending' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskError::StorageError(e.to_string()))?;

        let count = ids.len();
        for id in ids {
            self.enqueue(parse_uuid(&id)?);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use std::sync::Arc;

    async fn setup() -> (Arc<SqliteTaskStore>, mpsc::Receiver<Uuid>) {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let (tx, rx) = mpsc::channel(100);
        (Arc::new(SqliteTaskStore::new(pool, tx)), rx)
    }

    fn new_task(text: &str) -> NewTask {
        NewTask {
            account_id: Some(Uuid::new_v4()),
            text: text.to_string(),
            voice_id: Uuid::new_v4(),
            estimated_secs: 60,
            credits_used: text.chars().count() as i64,
        }
    }

    #[tokio::test]
    async fn test_create_enqueues_pending_task() {
        let (store, mut rx) = setup().await;
        let task = store.create(new_task("hello")).await.unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(rx.try_recv().unwrap(), task.id);
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("hello")).await.unwrap();

        let claimed = store.claim_for_processing(task.id).await.unwrap();
        assert_eq!(claimed.status, TaskStatus::Processing);
        assert!(claimed.started_at.is_some());

        store.update_progress(task.id, 42).await.unwrap();
        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.progress, 42);

        let completed = store
            .complete(task.id, "/media/generated/out.wav", 1234, Some(5000))
            .await
            .unwrap();
        assert!(!completed.already_completed);
        assert_eq!(completed.task.status, TaskStatus::Completed);
        assert_eq!(completed.task.progress, 100);
        assert_eq!(completed.task.audio_path.as_deref(), Some("/media/generated/out.wav"));
        assert!(completed.task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_claim_race_exactly_one_winner() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("race")).await.unwrap();

        let (a, b) = tokio::join!(
            store.claim_for_processing(task.id),
            store.claim_for_processing(task.id)
        );

        let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(winners, 1);

        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(TaskError::AlreadyClaimed { .. })));

        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.status, TaskStatus::Processing);
    }

    #[tokio::test]
    async fn test_progress_clamped_to_99() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("clamp")).await.unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        store.update_progress(task.id, 100).await.unwrap();
        let current = store.get(task.id).await.unwrap().unwrap();
        // 100 保留给 complete 迁移
        assert_eq!(current.progress, 99);
        assert_eq!(current.status, TaskStatus::Processing);
    }

    #[tokio::test]
    async fn test_progress_rejected_when_pending() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("early")).await.unwrap();

        let result = store.update_progress(task.id, 10).await;
        assert!(matches!(result, Err(TaskError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("idem")).await.unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        let first = store
            .complete(task.id, "/media/a.wav", 10, Some(1000))
            .await
            .unwrap();
        assert!(!first.already_completed);

        // 崩溃后重试最后一步：返回现有行，结果指针不被覆盖
        let second = store
            .complete(task.id, "/media/b.wav", 20, Some(2000))
            .await
            .unwrap();
        assert!(second.already_completed);
        assert_eq!(second.task.audio_path.as_deref(), Some("/media/a.wav"));
        assert_eq!(second.task.file_size, 10);
    }

    #[tokio::test]
    async fn test_fail_records_error() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("boom")).await.unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        let failed = store.fail(task.id, "Synthesis timeout").await.unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("Synthesis timeout"));
    }

    #[tokio::test]
    async fn test_terminal_states_are_immutable() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("final")).await.unwrap();
        store.claim_for_processing(task.id).await.unwrap();
        store.fail(task.id, "dead").await.unwrap();

        assert!(store.claim_for_processing(task.id).await.is_err());
        assert!(store.update_progress(task.id, 50).await.is_err());
        assert!(store.complete(task.id, "/x.wav", 1, None).await.is_err());
        assert!(store.fail(task.id, "again").await.is_err());

        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.status, TaskStatus::Failed);
        assert_eq!(current.error_message.as_deref(), Some("dead"));
    }

    #[tokio::test]
    async fn test_queue_counts() {
        let (store, _rx) = setup().await;
        let first = store.create(new_task("first")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create(new_task("second")).await.unwrap();

        assert_eq!(store.count_pending_before(first.created_at).await.unwrap(), 0);
        assert_eq!(store.count_pending_before(second.created_at).await.unwrap(), 1);
        assert_eq!(store.count_processing().await.unwrap(), 0);

        store.claim_for_processing(first.id).await.unwrap();
        assert_eq!(store.count_processing().await.unwrap(), 1);
        assert_eq!(store.count_pending_before(second.created_at).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_requeue_stale_resets_and_enqueues() {
        let (store, mut rx) = setup().await;
        let task = store.create(new_task("stuck")).await.unwrap();
        rx.try_recv().unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        // 阈值取未来时刻，刚认领的任务即视为超时
        let threshold = Utc::now() + chrono::Duration::seconds(5);
        let requeued = store.requeue_stale(threshold).await.unwrap();
        assert_eq!(requeued, vec![task.id]);

        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.status, TaskStatus::Pending);
        assert_eq!(current.progress, 0);
        assert!(current.started_at.is_none());
        assert_eq!(rx.try_recv().unwrap(), task.id);
    }

    #[tokio::test]
    async fn test_requeue_stale_skips_fresh_tasks() {
        let (store, _rx) = setup().await;
        let task = store.create(new_task("fresh")).await.unwrap();
        store.claim_for_processing(task.id).await.unwrap();

        let threshold = Utc::now() - chrono::Duration::seconds(600);
        let requeued = store.requeue_stale(threshold).await.unwrap();
        assert!(requeued.is_empty());

        let current = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(current.status, TaskStatus::Processing);
    }

    #[tokio::test]
    async fn test_enqueue_pending_after_restart() {
        let (store, mut rx) = setup().await;
        store.create(new_task("one")).await.unwrap();
        store.create(new_task("two")).await.unwrap();
        // 模拟重启后的空通道
        while rx.try_recv().is_ok() {}

        let count = store.enqueue_pending().await.unwrap();
        assert_eq!(count, 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}
