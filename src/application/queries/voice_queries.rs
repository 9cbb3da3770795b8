//! Voice Queries - 音色查询定义

use uuid::Uuid;

/// 查询音色
#[derive(Debug, Clone)]
pub struct GetVoiceQuery {
    pub id: Uuid,
}

/// 列出可用音色
#[derive(Debug, Clone)]
pub struct ListVoicesQuery {
    /// None 时只列公共音色
    pub account_id: Option<Uuid>,
}
