//! Fake TTS Client - 用于测试的合成客户端
//!
//! 返回固定的音频字节，不调用外部服务

use async_trait::async_trait;

use crate::application::ports::{
    SynthesisError, SynthesisRequest, SynthesisResponse, SynthesizerPort,
};

/// Fake TTS Client
///
/// 返回配置的固定音频，可配置为始终失败
pub struct FakeTtsClient {
    audio_data: Vec<u8>,
    duration_ms: Option<i64>,
    fail_with: Option<String>,
}

impl FakeTtsClient {
    /// 创建始终成功的客户端
    pub fn new(audio_data: Vec<u8>, duration_ms: Option<i64>) -> Self {
        Self {
            audio_data,
            duration_ms,
            fail_with: None,
        }
    }

    /// 创建始终失败的客户端
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            audio_data: Vec::new(),
            duration_ms: None,
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl SynthesizerPort for FakeTtsClient {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisResponse, SynthesisError> {
        if let Some(message) = &self.fail_with {
            return Err(SynthesisError::ServiceError(message.clone()));
        }

        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "FakeTtsClient: returning fixed audio"
        );

        Ok(SynthesisResponse {
            audio_data: self.audio_data.clone(),
            duration_ms: self.duration_ms,
            sample_rate: Some(22050),
        })
    }

    async fn health_check(&self) -> bool {
        self.fail_with.is_none()
    }
}
