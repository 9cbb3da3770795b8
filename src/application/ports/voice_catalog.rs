//! Voice Catalog Port - 音色目录
//!
//! 公共音色（account_id 为空）对所有账户可用，
//! 私有音色仅对所属账户可用

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 音色记录
#[derive(Debug, Clone)]
pub struct VoiceRecord {
    pub id: Uuid,
    /// 所属账户，None 表示公共音色库
    pub account_id: Option<Uuid>,
    pub name: String,
    /// 参考音频路径（交给合成服务下载 / 读取）
    pub reference_audio_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl VoiceRecord {
    /// 音色是否对指定账户可用
    pub fn is_accessible_by(&self, account_id: Uuid) -> bool {
        match self.account_id {
            None => true,
            Some(owner) => owner == account_id,
        }
    }
}

/// Voice Catalog Port
#[async_trait]
pub trait VoiceCatalogPort: Send + Sync {
    /// 保存音色
    async fn save(&self, voice: &VoiceRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找音色
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VoiceRecord>, RepositoryError>;

    /// 列出账户可用音色（公共 + 自有）；account_id 为 None 时只列公共音色
    async fn list_accessible(
        &self,
        account_id: Option<Uuid>,
    ) -> Result<Vec<VoiceRecord>, RepositoryError>;

    /// 删除音色
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
