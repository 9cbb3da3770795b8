//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/account/create       POST  创建账户（附赠免费信用点）
//! - /api/account/get          POST  获取账户详情
//! - /api/account/topup        POST  充值信用点
//! - /api/account/transactions POST  账单流水
//! - /api/voice/create         POST  登记音色
//! - /api/voice/get            POST  获取音色详情
//! - /api/voice/list           GET   列出可用音色
//! - /api/voice/delete         POST  删除音色
//! - /api/tts/submit           POST  提交生成任务（异步，立即返回任务 ID）
//! - /api/tts/status           POST  查询任务状态 / 排队位置
//! - /api/tts/list             POST  列出账户的生成任务

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/account", account_routes())
        .nest("/voice", voice_routes())
        .nest("/tts", tts_routes())
}

/// Account 路由
fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_account))
        .route("/get", post(handlers::get_account))
        .route("/topup", post(handlers::topup_credits))
        .route("/transactions", post(handlers::list_transactions))
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_voice))
        .route("/get", post(handlers::get_voice))
        .route("/list", get(handlers::list_voices))
        .route("/delete", post(handlers::delete_voice))
}

/// TTS 路由
fn tts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submit", post(handlers::submit_generation))
        .route("/status", post(handlers::task_status))
        .route("/list", post(handlers::list_tasks))
}
