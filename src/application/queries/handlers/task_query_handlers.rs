//! Task Query Handlers - 进度/队列投影
//!
//! 只读投影，绝不修改 Task Store 状态。
//! 队列位置 = 早于该任务创建且仍 pending 的任务数 + 当前 processing 的任务数
//! （每个在途任务都排在等待任务前面）；终止状态与处理中的任务位置为 0。

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{GenerationTask, TaskStorePort};
use crate::application::queries::{ListTasksQuery, TaskStatusQuery, TaskStatusView};
use crate::domain::TaskStatus;

/// TaskStatus Handler - 查询任务状态与队列位置
pub struct TaskStatusHandler {
    task_store: Arc<dyn TaskStorePort>,
    /// 平均任务耗时（秒），用于预估等待时间；固定配置，不做历史学习
    average_task_secs: i64,
}

impl TaskStatusHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>, average_task_secs: i64) -> Self {
        Self {
            task_store,
            average_task_secs,
        }
    }

    pub async fn handle(&self, query: TaskStatusQuery) -> Result<TaskStatusView, ApplicationError> {
        let task = self
            .task_store
            .get(query.task_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Task", query.task_id))?;

        let queue_position = match task.status {
            TaskStatus::Pending => {
                let ahead = self.task_store.count_pending_before(task.created_at).await?;
                let processing = self.task_store.count_processing().await?;
                ahead + processing
            }
            // 处理中或已终止的任务不再排队
            _ => 0,
        };

        let estimated_wait_secs = queue_position * self.average_task_secs;

        Ok(TaskStatusView {
            task_id: task.id,
            status: task.status,
            progress: task.progress,
            queue_position,
            estimated_wait_secs,
            estimated_secs: task.estimated_secs,
            audio_url: task.audio_path,
            error: task.error_message,
        })
    }
}

/// ListTasks Handler - 账户任务列表
pub struct ListTasksHandler {
    task_store: Arc<dyn TaskStorePort>,
}

impl ListTasksHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>) -> Self {
        Self { task_store }
    }

    pub async fn handle(
        &self,
        query: ListTasksQuery,
    ) -> Result<Vec<GenerationTask>, ApplicationError> {
        Ok(self.task_store.list_by_account(query.account_id).await?)
    }
}
