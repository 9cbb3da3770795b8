//! File Artifact Store - 文件系统音频产物存储
//!
//! 实现 ArtifactStorePort trait
//!
//! 产物按日期分目录：generated/YYYY/MM/DD/{task_id}.wav，
//! 对外 URL 为 /media/ 前缀加相对路径

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{ArtifactError, ArtifactStorePort, StoredArtifact};

/// 文件系统产物存储
pub struct FileArtifactStore {
    /// 存储根目录
    media_dir: PathBuf,
}

impl FileArtifactStore {
    /// 创建新的文件存储
    pub async fn new(media_dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let media_dir = media_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&media_dir)
            .await
            .map_err(|e| ArtifactError::IoError(e.to_string()))?;

        Ok(Self { media_dir })
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    fn relative_path(task_id: Uuid) -> String {
        let now = Utc::now();
        format!(
            "generated/{:04}/{:02}/{:02}/{}.wav",
            now.year(),
            now.month(),
            now.day(),
            task_id
        )
    }
}

#[async_trait]
impl ArtifactStorePort for FileArtifactStore {
    async fn store(&self, task_id: Uuid, data: &[u8]) -> Result<StoredArtifact, ArtifactError> {
        let relative = Self::relative_path(task_id);
        let full_path = self.media_dir.join(&relative);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ArtifactError::IoError(e.to_string()))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| ArtifactError::IoError(e.to_string()))?;

        tracing::debug!(
            task_id = %task_id,
            path = %relative,
            size = data.len(),
            "Stored audio artifact"
        );

        Ok(StoredArtifact {
            path: relative.clone(),
            url: format!("/media/{}", relative),
            file_size: data.len() as i64,
        })
    }

    async fn remove(&self, path: &str) -> Result<(), ArtifactError> {
        let full_path = self.media_dir.join(path);

        if full_path.exists() {
            fs::remove_file(&full_path)
                .await
                .map_err(|e| ArtifactError::IoError(e.to_string()))?;
            tracing::debug!(path = %path, "Removed audio artifact");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_and_remove() {
        let temp_dir = tempdir().unwrap();
        let store = FileArtifactStore::new(temp_dir.path()).await.unwrap();

        let task_id = Uuid::new_v4();
        let data = b"fake wav data";

        let artifact = store.store(task_id, data).await.unwrap();
        assert_eq!(artifact.file_size, data.len() as i64);
        assert!(artifact.path.starts_with("generated/"));
        assert!(artifact.path.ends_with(&format!("{}.wav", task_id)));
        assert_eq!(artifact.url, format!("/media/{}", artifact.path));

        let full_path = temp_dir.path().join(&artifact.path);
        assert!(full_path.exists());
        assert_eq!(fs::read(&full_path).await.unwrap(), data);

        store.remove(&artifact.path).await.unwrap();
        assert!(!full_path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let temp_dir = tempdir().unwrap();
        let store = FileArtifactStore::new(temp_dir.path()).await.unwrap();

        store.remove("generated/2026/01/01/missing.wav").await.unwrap();
    }
}
