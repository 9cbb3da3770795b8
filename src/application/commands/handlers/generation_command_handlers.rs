//! Generation Command Handlers
//!
//! 提交校验链（快速失败，按序）：
//! 1. 文本非空且不超长
//! 2. 音色存在且对账户可用
//! 3. 按计费策略计算所需信用点
//! 4. 余额充足
//!
//! 通过后创建 pending 任务并入队，立即返回任务 ID

use std::sync::Arc;

use crate::application::commands::{SubmitGenerationCommand, SubmitGenerationResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{LedgerPort, NewTask, TaskStorePort, VoiceCatalogPort};
use crate::domain::credits::estimate_secs;
use crate::domain::CreditPolicy;

/// SubmitGeneration Handler - 提交生成任务
pub struct SubmitGenerationHandler {
    ledger: Arc<dyn LedgerPort>,
    task_store: Arc<dyn TaskStorePort>,
    voice_catalog: Arc<dyn VoiceCatalogPort>,
    policy: CreditPolicy,
    max_text_length: usize,
}

impl SubmitGenerationHandler {
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        task_store: Arc<dyn TaskStorePort>,
        voice_catalog: Arc<dyn VoiceCatalogPort>,
        policy: CreditPolicy,
        max_text_length: usize,
    ) -> Self {
        Self {
            ledger,
            task_store,
            voice_catalog,
            policy,
            max_text_length,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitGenerationCommand,
    ) -> Result<SubmitGenerationResponse, ApplicationError> {
        let text = cmd.text.trim();
        if text.is_empty() {
            return Err(ApplicationError::validation("Text cannot be empty"));
        }

        let char_count = text.chars().count();
        if char_count > self.max_text_length {
            return Err(ApplicationError::validation(format!(
                "Text too long: {} characters (max {})",
                char_count, self.max_text_length
            )));
        }

        let voice = self
            .voice_catalog
            .find_by_id(cmd.voice_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", cmd.voice_id))?;

        if !voice.is_accessible_by(cmd.account_id) {
            return Err(ApplicationError::business_rule(
                "Voice is owned by another account",
            ));
        }

        let credits_needed = self.policy.credits_needed(text);

        let balance = self.ledger.balance(cmd.account_id).await?;
        if balance < credits_needed {
            tracing::warn!(
                account_id = %cmd.account_id,
                required = credits_needed,
                available = balance,
                "Submission rejected: insufficient credits"
            );
            return Err(ApplicationError::InsufficientCredits {
                required: credits_needed,
                available: balance,
            });
        }

        let estimated_secs = estimate_secs(char_count);

        let task = self
            .task_store
            .create(NewTask {
                account_id: Some(cmd.account_id),
                text: text.to_string(),
                voice_id: cmd.voice_id,
                estimated_secs,
                credits_used: credits_needed,
            })
            .await?;

        tracing::info!(
            task_id = %task.id,
            account_id = %cmd.account_id,
            voice_id = %cmd.voice_id,
            units = self.policy.units(text),
            unit_mode = self.policy.calculation.as_str(),
            credits_needed = credits_needed,
            estimated_secs = estimated_secs,
            "Generation task submitted"
        );

        Ok(SubmitGenerationResponse {
            task_id: task.id,
            credits_needed,
            estimated_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{PlanTier, VoiceRecord};
    use crate::domain::{CreditCalculation, TransactionKind};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteLedgerStore, SqliteTaskStore,
        SqliteVoiceRepository,
    };
    use chrono::Utc;
    use std::path::PathBuf;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    struct Fixture {
        handler: SubmitGenerationHandler,
        ledger: Arc<SqliteLedgerStore>,
        task_store: Arc<SqliteTaskStore>,
        account_id: Uuid,
        voice_id: Uuid,
    }

    /// 账户余额 50，公共音色一个，逐字符计费 1 点
    async fn setup() -> Fixture {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (tx, _rx) = mpsc::channel(100);
        let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
        let task_store = Arc::new(SqliteTaskStore::new(pool.clone(), tx));
        let voice_catalog = Arc::new(SqliteVoiceRepository::new(pool));

        let account = ledger
            .create_account("singer@example.com", PlanTier::Free)
            .await
            .unwrap();
        ledger
            .credit(account.id, 50, TransactionKind::Purchase, "Initial purchase")
            .await
            .unwrap();

        let voice_id = Uuid::new_v4();
        voice_catalog
            .save(&VoiceRecord {
                id: voice_id,
                account_id: None,
                name: "Library Voice".to_string(),
                reference_audio_path: PathBuf::from("voices/library.wav"),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let handler = SubmitGenerationHandler::new(
            ledger.clone(),
            task_store.clone(),
            voice_catalog,
            CreditPolicy::new(CreditCalculation::PerCharacter, 1),
            5000,
        );

        Fixture {
            handler,
            ledger,
            task_store,
            account_id: account.id,
            voice_id,
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_task_without_charging() {
        let fx = setup().await;

        let response = fx
            .handler
            .handle(SubmitGenerationCommand {
                account_id: fx.account_id,
                text: "hello world".to_string(),
                voice_id: fx.voice_id,
            })
            .await
            .unwrap();

        assert_eq!(response.credits_needed, 11);
        assert_eq!(response.estimated_secs, estimate_secs(11));

        let tasks = fx.task_store.list_by_account(fx.account_id).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, response.task_id);
        assert_eq!(tasks[0].credits_used, 11);

        // 提交只校验不扣费，扣费发生在完成之后
        assert_eq!(fx.ledger.balance(fx.account_id).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_text() {
        let fx = setup().await;

        let result = fx
            .handler
            .handle(SubmitGenerationCommand {
                account_id: fx.account_id,
                text: "   ".to_string(),
                voice_id: fx.voice_id,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_voice() {
        let fx = setup().await;

        let result = fx
            .handler
            .handle(SubmitGenerationCommand {
                account_id: fx.account_id,
                text: "hello".to_string(),
                voice_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_submit_rejects_insufficient_balance() {
        let fx = setup().await;

        let text = "x".repeat(51);
        let result = fx
            .handler
            .handle(SubmitGenerationCommand {
                account_id: fx.account_id,
                text,
                voice_id: fx.voice_id,
            })
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::InsufficientCredits {
                required: 51,
                available: 50,
            })
        ));

        // 拒绝的提交不留任务
        let tasks = fx.task_store.list_by_account(fx.account_id).await.unwrap();
        assert!(tasks.is_empty());
    }
}
