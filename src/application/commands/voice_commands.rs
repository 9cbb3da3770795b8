//! Voice Commands - 音色命令定义

use std::path::PathBuf;
use uuid::Uuid;

/// 创建音色
#[derive(Debug, Clone)]
pub struct CreateVoiceCommand {
    /// 所属账户，None 表示加入公共音色库
    pub account_id: Option<Uuid>,
    pub name: String,
    pub reference_audio_path: PathBuf,
}

/// 删除音色
#[derive(Debug, Clone)]
pub struct DeleteVoiceCommand {
    pub id: Uuid,
    /// 发起删除的账户；私有音色只允许所有者删除
    pub account_id: Option<Uuid>,
}
