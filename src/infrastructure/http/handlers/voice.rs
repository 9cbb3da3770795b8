//! Voice Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{CreateVoiceCommand, DeleteVoiceCommand, GetVoiceQuery, ListVoicesQuery};
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub id: Uuid,
    pub account_id: Option<Uuid>,
    pub name: String,
    pub is_public: bool,
    pub created_at: String,
}

impl From<crate::application::VoiceRecord> for VoiceResponse {
    fn from(v: crate::application::VoiceRecord) -> Self {
        Self {
            id: v.id,
            account_id: v.account_id,
            is_public: v.account_id.is_none(),
            name: v.name,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Create Voice
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateVoiceRequest {
    /// 为空表示加入公共音色库
    pub account_id: Option<Uuid>,
    pub name: String,
    pub reference_audio_path: String,
}

pub async fn create_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVoiceRequest>,
) -> Result<Json<ApiResponse<VoiceResponse>>, ApiError> {
    let cmd = CreateVoiceCommand {
        account_id: req.account_id,
        name: req.name,
        reference_audio_path: PathBuf::from(req.reference_audio_path),
    };

    let voice = state.create_voice_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(voice.into())))
}

// ============================================================================
// Get Voice
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetVoiceRequest {
    pub id: Uuid,
}

pub async fn get_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetVoiceRequest>,
) -> Result<Json<ApiResponse<VoiceResponse>>, ApiError> {
    let voice = state
        .get_voice_handler
        .handle(GetVoiceQuery { id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(voice.into())))
}

// ============================================================================
// List Voices
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListVoicesParams {
    /// 带上账户 ID 时包含该账户的私有音色
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListVoicesResponse {
    pub total: usize,
    pub voices: Vec<VoiceResponse>,
}

pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListVoicesParams>,
) -> Result<Json<ApiResponse<ListVoicesResponse>>, ApiError> {
    let voices = state
        .list_voices_handler
        .handle(ListVoicesQuery {
            account_id: params.account_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ListVoicesResponse {
        total: voices.len(),
        voices: voices.into_iter().map(Into::into).collect(),
    })))
}

// ============================================================================
// Delete Voice
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DeleteVoiceRequest {
    pub id: Uuid,
    pub account_id: Option<Uuid>,
}

pub async fn delete_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteVoiceRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let cmd = DeleteVoiceCommand {
        id: req.id,
        account_id: req.account_id,
    };

    state.delete_voice_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok()))
}
