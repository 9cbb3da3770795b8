//! Synthesizer Port - 外部语音合成服务抽象
//!
//! 外部服务视为不透明且不可靠：调用必须带硬超时，
//! 且不做隐式重试（重复调用会带来重复扣费风险，重试由上层决定）

use async_trait::async_trait;
use thiserror::Error;

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 参考音频的 URL 或路径
    pub reference_audio: String,
    /// 音色 ID（用于日志和追踪）
    pub voice_id: String,
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// 合成的音频数据（WAV/PCM）
    pub audio_data: Vec<u8>,
    /// 音频时长（毫秒）
    pub duration_ms: Option<i64>,
    /// 采样率
    pub sample_rate: Option<u32>,
}

/// Synthesizer Port
#[async_trait]
pub trait SynthesizerPort: Send + Sync {
    /// 执行一次合成调用
    async fn synthesize(&self, request: SynthesisRequest)
        -> Result<SynthesisResponse, SynthesisError>;

    /// 检查合成服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
