//! Task Queries - 任务状态查询定义

use uuid::Uuid;

use crate::domain::TaskStatus;

/// 查询任务状态
#[derive(Debug, Clone)]
pub struct TaskStatusQuery {
    pub task_id: Uuid,
}

/// 任务状态投影
#[derive(Debug, Clone)]
pub struct TaskStatusView {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub progress: u8,
    /// 排在该任务之前的任务数（pending 之前创建的 + 正在处理的）
    pub queue_position: i64,
    /// 预估等待时间（秒）= queue_position * 平均任务耗时
    pub estimated_wait_secs: i64,
    /// 任务自身的预估合成耗时（秒）
    pub estimated_secs: i64,
    pub audio_url: Option<String>,
    pub error: Option<String>,
}

/// 查询账户任务列表
#[derive(Debug, Clone)]
pub struct ListTasksQuery {
    pub account_id: Uuid,
}
