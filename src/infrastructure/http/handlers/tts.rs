//! Generation Handlers
//!
//! 提交为 fire-and-forget：校验通过即返回任务 ID，
//! 合成结果通过 /api/tts/status 轮询获取

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{ListTasksQuery, SubmitGenerationCommand, TaskStatusQuery};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Submit Generation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitGenerationRequest {
    pub account_id: Uuid,
    pub voice_id: Uuid,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitGenerationResponseDto {
    pub task_id: Uuid,
    pub credits_needed: i64,
    pub estimated_secs: i64,
}

pub async fn submit_generation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitGenerationRequest>,
) -> Result<Json<ApiResponse<SubmitGenerationResponseDto>>, ApiError> {
    let cmd = SubmitGenerationCommand {
        account_id: req.account_id,
        voice_id: req.voice_id,
        text: req.text,
    };

    let result = state.submit_generation_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(SubmitGenerationResponseDto {
        task_id: result.task_id,
        credits_needed: result.credits_needed,
        estimated_secs: result.estimated_secs,
    })))
}

// ============================================================================
// Task Status
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TaskStatusResponseDto {
    pub task_id: Uuid,
    pub status: String,
    pub progress: u8,
    pub queue_position: i64,
    pub estimated_wait_secs: i64,
    pub estimated_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskStatusRequest>,
) -> Result<Json<ApiResponse<TaskStatusResponseDto>>, ApiError> {
    let view = state
        .task_status_handler
        .handle(TaskStatusQuery {
            task_id: req.task_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(TaskStatusResponseDto {
        task_id: view.task_id,
        status: view.status.as_str().to_string(),
        progress: view.progress,
        queue_position: view.queue_position,
        estimated_wait_secs: view.estimated_wait_secs,
        estimated_secs: view.estimated_secs,
        audio_url: view.audio_url,
        error: view.error,
    })))
}

// ============================================================================
// List Tasks
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListTasksRequest {
    pub account_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TaskSummaryDto {
    pub task_id: Uuid,
    pub status: String,
    pub progress: u8,
    pub credits_used: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub total: usize,
    pub tasks: Vec<TaskSummaryDto>,
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListTasksRequest>,
) -> Result<Json<ApiResponse<ListTasksResponse>>, ApiError> {
    let tasks = state
        .list_tasks_handler
        .handle(ListTasksQuery {
            account_id: req.account_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ListTasksResponse {
        total: tasks.len(),
        tasks: tasks
            .into_iter()
            .map(|t| TaskSummaryDto {
                task_id: t.id,
                status: t.status.as_str().to_string(),
                progress: t.progress,
                credits_used: t.credits_used,
                audio_url: t.audio_path,
                created_at: t.created_at.to_rfc3339(),
            })
            .collect(),
    })))
}
