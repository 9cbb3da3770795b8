//! Vocalis - 语音克隆生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Credits: 计费策略与耗时估算
//! - Task: 生成任务状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Ledger, TaskStore, VoiceCatalog, Synthesizer, ArtifactStore）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Worker: GenerationWorker 后台合成 + StaleTaskReaper 超时回收
//! - Persistence: SQLite 存储（账户、账本、音色、任务）
//! - Adapters: TTS Client, Artifact Store

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
