//! Artifact Store Port - 合成结果存储
//!
//! 合成成功后持久化音频产物，返回可下载的 URL 路径

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 产物存储错误
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    IoError(String),
}

/// 已存储的产物
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    /// 相对存储根目录的路径
    pub path: String,
    /// 对外可访问的 URL 路径
    pub url: String,
    /// 文件大小（字节）
    pub file_size: i64,
}

/// Artifact Store Port
#[async_trait]
pub trait ArtifactStorePort: Send + Sync {
    /// 持久化音频字节
    async fn store(&self, task_id: Uuid, data: &[u8]) -> Result<StoredArtifact, ArtifactError>;

    /// 删除产物（失败路径上的临时产物清理）
    async fn remove(&self, path: &str) -> Result<(), ArtifactError>;
}
