//! Voice Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{VoiceCatalogPort, VoiceRecord};
use crate::application::queries::{GetVoiceQuery, ListVoicesQuery};

/// GetVoice Handler - 查询音色
pub struct GetVoiceHandler {
    voice_catalog: Arc<dyn VoiceCatalogPort>,
}

impl GetVoiceHandler {
    pub fn new(voice_catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { voice_catalog }
    }

    pub async fn handle(&self, query: GetVoiceQuery) -> Result<VoiceRecord, ApplicationError> {
        self.voice_catalog
            .find_by_id(query.id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", query.id))
    }
}

/// ListVoices Handler - 列出可用音色
pub struct ListVoicesHandler {
    voice_catalog: Arc<dyn VoiceCatalogPort>,
}

impl ListVoicesHandler {
    pub fn new(voice_catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { voice_catalog }
    }

    pub async fn handle(&self, query: ListVoicesQuery) -> Result<Vec<VoiceRecord>, ApplicationError> {
        Ok(self.voice_catalog.list_accessible(query.account_id).await?)
    }
}
