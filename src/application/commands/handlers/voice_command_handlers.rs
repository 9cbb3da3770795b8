//! Voice Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{CreateVoiceCommand, DeleteVoiceCommand};
use crate::application::error::ApplicationError;
use crate::application::ports::{VoiceCatalogPort, VoiceRecord};

/// CreateVoice Handler - 登记音色
pub struct CreateVoiceHandler {
    voice_catalog: Arc<dyn VoiceCatalogPort>,
}

impl CreateVoiceHandler {
    pub fn new(voice_catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { voice_catalog }
    }

    pub async fn handle(&self, cmd: CreateVoiceCommand) -> Result<VoiceRecord, ApplicationError> {
        if cmd.name.trim().is_empty() {
            return Err(ApplicationError::validation("Voice name cannot be empty"));
        }
        if cmd.reference_audio_path.as_os_str().is_empty() {
            return Err(ApplicationError::validation(
                "Reference audio path cannot be empty",
            ));
        }

        let voice = VoiceRecord {
            id: Uuid::new_v4(),
            account_id: cmd.account_id,
            name: cmd.name.trim().to_string(),
            reference_audio_path: cmd.reference_audio_path,
            created_at: Utc::now(),
        };

        self.voice_catalog.save(&voice).await?;

        tracing::info!(
            voice_id = %voice.id,
            name = %voice.name,
            public = voice.account_id.is_none(),
            "Voice created"
        );

        Ok(voice)
    }
}

/// DeleteVoice Handler - 删除音色
pub struct DeleteVoiceHandler {
    voice_catalog: Arc<dyn VoiceCatalogPort>,
}

impl DeleteVoiceHandler {
    pub fn new(voice_catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { voice_catalog }
    }

    pub async fn handle(&self, cmd: DeleteVoiceCommand) -> Result<(), ApplicationError> {
        let voice = self
            .voice_catalog
            .find_by_id(cmd.id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", cmd.id))?;

        // 私有音色只允许所有者删除
        if let Some(owner) = voice.account_id {
            if cmd.account_id != Some(owner) {
                return Err(ApplicationError::business_rule(
                    "Voice is owned by another account",
                ));
            }
        }

        self.voice_catalog.delete(cmd.id).await?;
        tracing::info!(voice_id = %cmd.id, "Voice deleted");
        Ok(())
    }
}
