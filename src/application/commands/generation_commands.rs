//! Generation Commands - 语音生成命令定义

use uuid::Uuid;

/// 提交生成任务
#[derive(Debug, Clone)]
pub struct SubmitGenerationCommand {
    pub account_id: Uuid,
    pub voice_id: Uuid,
    pub text: String,
}

/// 提交结果
///
/// 提交即返回，不等待生成完成；客户端通过轮询查询进度
#[derive(Debug, Clone)]
pub struct SubmitGenerationResponse {
    pub task_id: Uuid,
    pub credits_needed: i64,
    pub estimated_secs: i64,
}
