//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artifact_store;
mod ledger;
mod synthesizer;
mod task_store;
mod voice_catalog;

pub use artifact_store::{ArtifactError, ArtifactStorePort, StoredArtifact};
pub use ledger::{AccountRecord, LedgerEntry, LedgerError, LedgerPort, PlanTier};
pub use synthesizer::{SynthesisError, SynthesisRequest, SynthesisResponse, SynthesizerPort};
pub use task_store::{
    CompletedTask, GenerationTask, NewTask, TaskError, TaskStorePort,
};
pub use voice_catalog::{RepositoryError, VoiceCatalogPort, VoiceRecord};
