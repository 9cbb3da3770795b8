//! Task Store Port - 生成任务持久化
//!
//! 任务行是多 worker 唯一会竞争的共享资源，claim_for_processing 的
//! 原子性是系统中唯一的互斥机制。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::TaskStatus;

/// Task Store 错误
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    #[error("Task already claimed: {task_id} (status: {status})")]
    AlreadyClaimed { task_id: Uuid, status: String },

    #[error("Invalid state transition for task {task_id}: {detail}")]
    InvalidTransition { task_id: Uuid, detail: String },

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// 生成任务
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub id: Uuid,
    /// 所属账户，匿名 / API-key 流程为 None
    pub account_id: Option<Uuid>,
    pub text: String,
    pub voice_id: Uuid,
    pub status: TaskStatus,
    /// 进度百分比 [0, 100]，100 仅由 complete 迁移写入
    pub progress: u8,
    /// 预估合成耗时（秒）
    pub estimated_secs: i64,
    /// 完成时应扣除的信用点
    pub credits_used: i64,
    /// 结果音频路径（completed 后非空）
    pub audio_path: Option<String>,
    pub file_size: i64,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 新任务参数
#[derive(Debug, Clone)]
pub struct NewTask {
    pub account_id: Option<Uuid>,
    pub text: String,
    pub voice_id: Uuid,
    pub estimated_secs: i64,
    pub credits_used: i64,
}

/// complete 的结果
///
/// already_completed 用于区分首次完成与幂等重放，
/// 调用方只在首次完成时执行扣费
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub task: GenerationTask,
    pub already_completed: bool,
}

/// Task Store Port
#[async_trait]
pub trait TaskStorePort: Send + Sync {
    /// 创建 pending 任务并入队
    async fn create(&self, new_task: NewTask) -> Result<GenerationTask, TaskError>;

    /// 根据 ID 查找任务
    async fn get(&self, task_id: Uuid) -> Result<Option<GenerationTask>, TaskError>;

    /// 原子认领: pending -> processing，记录 started_at
    ///
    /// 任务不处于 pending 时返回 AlreadyClaimed，竞争失败的 worker
    /// 必须放弃该任务
    async fn claim_for_processing(&self, task_id: Uuid) -> Result<GenerationTask, TaskError>;

    /// 更新进度，仅允许 processing 状态，钳制到 [0, 99]
    async fn update_progress(&self, task_id: Uuid, percent: u8) -> Result<(), TaskError>;

    /// processing -> completed，progress=100，记录结果指针
    ///
    /// 任务已是 completed 时幂等返回现有行（worker 崩溃后重试最后一步）
    async fn complete(
        &self,
        task_id: Uuid,
        audio_path: &str,
        file_size: i64,
        duration_ms: Option<i64>,
    ) -> Result<CompletedTask, TaskError>;

    /// processing -> failed，记录错误信息
    async fn fail(&self, task_id: Uuid, error: &str) -> Result<GenerationTask, TaskError>;

    /// 账户的任务列表（按创建时间倒序）
    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<GenerationTask>, TaskError>;

    /// 早于给定时刻创建且仍 pending 的任务数（队列位置计算用）
    async fn count_pending_before(&self, created_at: DateTime<Utc>) -> Result<i64, TaskError>;

    /// 当前 processing 的任务数
    async fn count_processing(&self) -> Result<i64, TaskError>;

    /// 将卡在 processing 且 started_at 早于阈值的任务重置回 pending
    /// 并重新入队，返回被重置的任务 ID
    async fn requeue_stale(&self, stale_before: DateTime<Utc>) -> Result<Vec<Uuid>, TaskError>;

    /// 将所有 pending 任务重新入队（进程重启后恢复，队列本身不持久）
    async fn enqueue_pending(&self) -> Result<usize, TaskError>;
}
