//! SQLite Voice Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::path::PathBuf;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{RepositoryError, VoiceCatalogPort, VoiceRecord};

/// SQLite Voice Repository
pub struct SqliteVoiceRepository {
    pool: DbPool,
}

impl SqliteVoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct VoiceRow {
    id: String,
    account_id: Option<String>,
    name: String,
    reference_audio_path: String,
    created_at: String,
}

impl TryFrom<VoiceRow> for VoiceRecord {
    type Error = RepositoryError;

    fn try_from(row: VoiceRow) -> Result<Self, Self::Error> {
        Ok(VoiceRecord {
            id: parse_uuid(&row.id)?,
            account_id: row.account_id.as_deref().map(parse_uuid).transpose()?,
            name: row.name,
            reference_audio_path: PathBuf::from(row.reference_audio_path),
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[async_trait]
impl VoiceCatalogPort for SqliteVoiceRepository {
    async fn save(&self, voice: &VoiceRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO voices (id, account_id, name, reference_audio_path, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(voice.id.to_string())
        .bind(voice.account_id.map(|id| id.to_string()))
        .bind(&voice.name)
        .bind(voice.reference_audio_path.display().to_string())
        .bind(voice.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(voice.id.to_string())
            }
            e => RepositoryError::DatabaseError(e.to_string()),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VoiceRecord>, RepositoryError> {
        let row: Option<VoiceRow> = sqlx::query_as(
            "SELECT id, account_id, name, reference_audio_path, created_at FROM voices WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(VoiceRecord::try_from).transpose()
    }

    async fn list_accessible(
        &self,
        account_id: Option<Uuid>,
    ) -> Result<Vec<VoiceRecord>, RepositoryError> {
        let rows: Vec<VoiceRow> = match account_id {
            Some(account_id) => {
                sqlx::query_as(
                    r#"
                    SELECT id, account_id, name, reference_audio_path, created_at
                    FROM voices WHERE account_id IS NULL OR account_id = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(account_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, account_id, name, reference_audio_path, created_at
                    FROM voices WHERE account_id IS NULL
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(VoiceRecord::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM voices WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
