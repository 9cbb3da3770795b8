//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CreateAccountHandler, CreateVoiceHandler, DeleteVoiceHandler, SubmitGenerationHandler,
    TopUpCreditsHandler,
    // Query handlers
    GetAccountHandler, GetVoiceHandler, ListTasksHandler, ListTransactionsHandler,
    ListVoicesHandler, TaskStatusHandler,
    // Ports
    LedgerPort, TaskStorePort, VoiceCatalogPort,
};
use crate::domain::CreditPolicy;

/// 业务参数（来自配置，无全局单例）
#[derive(Debug, Clone)]
pub struct BusinessRules {
    /// 计费策略
    pub policy: CreditPolicy,
    /// 新账户赠送的信用点
    pub free_trial_credits: i64,
    /// 单次提交的最大文本长度（字符）
    pub max_text_length: usize,
    /// 估算排队等待用的平均任务耗时（秒）
    pub average_task_secs: i64,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub ledger: Arc<dyn LedgerPort>,
    pub task_store: Arc<dyn TaskStorePort>,
    pub voice_catalog: Arc<dyn VoiceCatalogPort>,

    // ========== Command Handlers ==========
    pub create_account_handler: CreateAccountHandler,
    pub topup_credits_handler: TopUpCreditsHandler,
    pub create_voice_handler: CreateVoiceHandler,
    pub delete_voice_handler: DeleteVoiceHandler,
    pub submit_generation_handler: SubmitGenerationHandler,

    // ========== Query Handlers ==========
    pub get_account_handler: GetAccountHandler,
    pub list_transactions_handler: ListTransactionsHandler,
    pub get_voice_handler: GetVoiceHandler,
    pub list_voices_handler: ListVoicesHandler,
    pub task_status_handler: TaskStatusHandler,
    pub list_tasks_handler: ListTasksHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        task_store: Arc<dyn TaskStorePort>,
        voice_catalog: Arc<dyn VoiceCatalogPort>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            // Ports
            ledger: ledger.clone(),
            task_store: task_store.clone(),
            voice_catalog: voice_catalog.clone(),

            // Command handlers
            create_account_handler: CreateAccountHandler::new(
                ledger.clone(),
                rules.free_trial_credits,
            ),
            topup_credits_handler: TopUpCreditsHandler::new(ledger.clone()),
            create_voice_handler: CreateVoiceHandler::new(voice_catalog.clone()),
            delete_voice_handler: DeleteVoiceHandler::new(voice_catalog.clone()),
            submit_generation_handler: SubmitGenerationHandler::new(
                ledger.clone(),
                task_store.clone(),
                voice_catalog.clone(),
                rules.policy,
                rules.max_text_length,
            ),

            // Query handlers
            get_account_handler: GetAccountHandler::new(ledger.clone()),
            list_transactions_handler: ListTransactionsHandler::new(ledger.clone()),
            get_voice_handler: GetVoiceHandler::new(voice_catalog.clone()),
            list_voices_handler: ListVoicesHandler::new(voice_catalog.clone()),
            task_status_handler: TaskStatusHandler::new(task_store.clone(), rules.average_task_secs),
            list_tasks_handler: ListTasksHandler::new(task_store.clone()),
        }
    }
}
