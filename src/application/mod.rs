//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Ledger、TaskStore、VoiceCatalog、Synthesizer、ArtifactStore）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Account commands
    CreateAccountCommand,
    TopUpCreditsCommand,
    TopUpCreditsResponse,
    // Generation commands
    SubmitGenerationCommand,
    SubmitGenerationResponse,
    // Voice commands
    CreateVoiceCommand,
    DeleteVoiceCommand,
    // Handlers
    handlers::{
        CreateAccountHandler, CreateVoiceHandler, DeleteVoiceHandler, SubmitGenerationHandler,
        TopUpCreditsHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Artifact store
    ArtifactError,
    ArtifactStorePort,
    StoredArtifact,
    // Ledger
    AccountRecord,
    LedgerEntry,
    LedgerError,
    LedgerPort,
    PlanTier,
    // Synthesizer
    SynthesisError,
    SynthesisRequest,
    SynthesisResponse,
    SynthesizerPort,
    // Task store
    CompletedTask,
    GenerationTask,
    NewTask,
    TaskError,
    TaskStorePort,
    // Voice catalog
    RepositoryError,
    VoiceCatalogPort,
    VoiceRecord,
};

pub use queries::{
    // Account queries
    GetAccountQuery,
    ListTransactionsQuery,
    // Task queries
    ListTasksQuery,
    TaskStatusQuery,
    TaskStatusView,
    // Voice queries
    GetVoiceQuery,
    ListVoicesQuery,
    // Handlers
    handlers::{
        GetAccountHandler, GetVoiceHandler, ListTasksHandler, ListTransactionsHandler,
        ListVoicesHandler, TaskStatusHandler,
    },
};
