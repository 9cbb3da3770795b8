//! Generation Worker - Background Synthesis Task Processor
//!
//! 从队列消费任务 ID，认领后执行合成、存储产物、落盘完成、扣费。
//!
//! 扣费严格发生在 complete 持久化之后：崩溃最坏留下
//! 已完成未扣费的任务，由对账处理，绝不会出现已扣费未完成。

use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::ports::{
    ArtifactStorePort, LedgerPort, SynthesisRequest, SynthesizerPort, TaskError, TaskStorePort,
    VoiceCatalogPort,
};

/// 认领成功后的起始进度
const PROGRESS_STARTED: u8 = 10;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 最大并发合成数
    pub max_concurrent: usize,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

/// 合成 Worker
///
/// 后台任务处理器，从队列消费任务并执行语音合成
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<Uuid>,
    task_store: Arc<dyn TaskStorePort>,
    ledger: Arc<dyn LedgerPort>,
    voice_catalog: Arc<dyn VoiceCatalogPort>,
    synthesizer: Arc<dyn SynthesizerPort>,
    artifact_store: Arc<dyn ArtifactStorePort>,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<Uuid>,
        task_store: Arc<dyn TaskStorePort>,
        ledger: Arc<dyn LedgerPort>,
        voice_catalog: Arc<dyn VoiceCatalogPort>,
        synthesizer: Arc<dyn SynthesizerPort>,
        artifact_store: Arc<dyn ArtifactStorePort>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            task_store,
            ledger,
            voice_catalog,
            synthesizer,
            artifact_store,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "GenerationWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(task_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            let task_store = self.task_store.clone();
            let ledger = self.ledger.clone();
            let voice_catalog = self.voice_catalog.clone();
            let synthesizer = self.synthesizer.clone();
            let artifact_store = self.artifact_store.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成

                Self::process_task(
                    task_id,
                    task_store,
                    ledger,
                    voice_catalog,
                    synthesizer,
                    artifact_store,
                )
                .await;
            });
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单个任务
    ///
    /// claim 是唯一的互斥点：同一任务被多次入队（重启恢复 +
    /// reaper 重投）时，只有一次调用能走到合成
    pub(crate) async fn process_task(
        task_id: Uuid,
        task_store: Arc<dyn TaskStorePort>,
        ledger: Arc<dyn LedgerPort>,
        voice_catalog: Arc<dyn VoiceCatalogPort>,
        synthesizer: Arc<dyn SynthesizerPort>,
        artifact_store: Arc<dyn ArtifactStorePort>,
    ) {
        // 认领任务
        let task = match task_store.claim_for_processing(task_id).await {
            Ok(t) => t,
            Err(TaskError::AlreadyClaimed { status, .. }) => {
                tracing::debug!(task_id = %task_id, status = %status, "Task already claimed, skipping");
                return;
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "Failed to claim task");
                return;
            }
        };

        if let Err(e) = task_store.update_progress(task_id, PROGRESS_STARTED).await {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to update progress");
        }

        // 加载音色
        let voice = match voice_catalog.find_by_id(task.voice_id).await {
            Ok(Some(v)) => v,
            Ok(None) => {
                tracing::error!(task_id = %task_id, voice_id = %task.voice_id, "Voice not found");
                Self::mark_failed(&task_store, task_id, "Voice not found").await;
                return;
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to load voice");
                Self::mark_failed(&task_store, task_id, &format!("Database error: {}", e)).await;
                return;
            }
        };

        // 执行合成
        let request = SynthesisRequest {
            text: task.text.clone(),
            reference_audio: voice.reference_audio_path.display().to_string(),
            voice_id: voice.id.to_string(),
        };

        let response = match synthesizer.synthesize(request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Synthesis failed");
                Self::mark_failed(&task_store, task_id, &format!("Synthesis error: {}", e)).await;
                return;
            }
        };

        // 持久化产物
        let artifact = match artifact_store.store(task_id, &response.audio_data).await {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to store artifact");
                Self::mark_failed(&task_store, task_id, &format!("Storage error: {}", e)).await;
                return;
            }
        };

        // 落盘完成状态
        let completed = match task_store
            .complete(task_id, &artifact.url, artifact.file_size, response.duration_ms)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                // complete 被拒绝（例如被 reaper 重置后另一次执行先完成），
                // 本次产物作废
                tracing::error!(task_id = %task_id, error = %e, "Failed to complete task");
                if let Err(e) = artifact_store.remove(&artifact.path).await {
                    tracing::warn!(task_id = %task_id, error = %e, "Failed to clean up artifact");
                }
                Self::mark_failed(&task_store, task_id, &format!("Completion error: {}", e)).await;
                return;
            }
        };

        // 扣费：只在首次完成时执行一次
        if completed.already_completed {
            tracing::debug!(task_id = %task_id, "Task was already completed, skipping charge");
            return;
        }

        if let Some(account_id) = completed.task.account_id {
            if completed.task.credits_used > 0 {
                let description = format!("Audio generation ({} credits)", completed.task.credits_used);
                match ledger
                    .debit(account_id, completed.task.credits_used, &description)
                    .await
                {
                    Ok(balance) => {
                        tracing::info!(
                            task_id = %task_id,
                            account_id = %account_id,
                            amount = completed.task.credits_used,
                            balance = balance,
                            "Credits charged"
                        );
                    }
                    Err(e) => {
                        // 任务保持 completed，不回滚不重试，等待对账
                        tracing::warn!(
                            task_id = %task_id,
                            account_id = %account_id,
                            amount = completed.task.credits_used,
                            error = %e,
                            "Task completed but uncharged, reconciliation required"
                        );
                    }
                }
            }
        }

        tracing::info!(
            task_id = %task_id,
            audio_url = %artifact.url,
            file_size = artifact.file_size,
            duration_ms = ?response.duration_ms,
            "Task completed"
        );
    }

    async fn mark_failed(task_store: &Arc<dyn TaskStorePort>, task_id: Uuid, error: &str) {
        if let Err(e) = task_store.fail(task_id, error).await {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to mark task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{NewTask, PlanTier, VoiceRecord};
    use crate::domain::TransactionKind;
    use crate::infrastructure::adapters::{FakeTtsClient, FileArtifactStore};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteLedgerStore, SqliteTaskStore,
        SqliteVoiceRepository,
    };
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct Fixture {
        task_store: Arc<dyn TaskStorePort>,
        ledger: Arc<dyn LedgerPort>,
        voice_catalog: Arc<dyn VoiceCatalogPort>,
        artifact_store: Arc<dyn ArtifactStorePort>,
        account_id: Uuid,
        voice_id: Uuid,
        _media_dir: tempfile::TempDir,
    }

    async fn setup(initial_credits: i64) -> Fixture {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (tx, _rx) = mpsc::channel(100);
        let task_store = Arc::new(SqliteTaskStore::new(pool.clone(), tx));
        let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
        let voice_catalog = Arc::new(SqliteVoiceRepository::new(pool));

        let account = ledger
            .create_account("worker@test.dev", PlanTier::Free)
            .await
            .unwrap();
        if initial_credits > 0 {
            ledger
                .credit(account.id, initial_credits, TransactionKind::Purchase, "Top up")
                .await
                .unwrap();
        }

        let voice = VoiceRecord {
            id: Uuid::new_v4(),
            account_id: None,
            name: "narrator".to_string(),
            reference_audio_path: PathBuf::from("voices/narrator.wav"),
            created_at: Utc::now(),
        };
        voice_catalog.save(&voice).await.unwrap();

        let media_dir = tempdir().unwrap();
        let artifact_store = Arc::new(FileArtifactStore::new(media_dir.path()).await.unwrap());

        Fixture {
            task_store,
            ledger,
            voice_catalog,
            artifact_store,
            account_id: account.id,
            voice_id: voice.id,
            _media_dir: media_dir,
        }
    }

    async fn submit(fx: &Fixture, text: &str, credits_used: i64) -> Uuid {
        fx.task_store
            .create(NewTask {
                account_id: Some(fx.account_id),
                text: text.to_string(),
                voice_id: fx.voice_id,
                estimated_secs: 60,
                credits_used,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_process_task_completes_and_charges_once() {
        let fx = setup(100).await;
        let task_id = submit(&fx, "hello world", 30).await;
        let synthesizer: Arc<dyn SynthesizerPort> =
            Arc::new(FakeTtsClient::new(b"RIFFdata".to_vec(), Some(2500)));

        GenerationWorker::process_task(
            task_id,
            fx.task_store.clone(),
            fx.ledger.clone(),
            fx.voice_catalog.clone(),
            synthesizer,
            fx.artifact_store.clone(),
        )
        .await;

        let task = fx.task_store.get(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, crate::domain::TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.audio_path.as_deref().unwrap().starts_with("/media/generated/"));
        assert_eq!(task.file_size, 8);
        assert_eq!(task.duration_ms, Some(2500));

        assert_eq!(fx.ledger.balance(fx.account_id).await.unwrap(), 70);
        let usage_entries: Vec<_> = fx
            .ledger
            .entries(fx.account_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.kind == TransactionKind::Usage)
            .collect();
        assert_eq!(usage_entries.len(), 1);
        assert_eq!(usage_entries[0].amount, -30);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_charges_exactly_once() {
        let fx = setup(100).await;
        let task_id = submit(&fx, "hello again", 30).await;
        let synthesizer: Arc<dyn SynthesizerPort> =
            Arc::new(FakeTtsClient::new(b"RIFFdata".to_vec(), None));

        for _ in 0..2 {
            GenerationWorker::process_task(
                task_id,
                fx.task_store.clone(),
                fx.ledger.clone(),
                fx.voice_catalog.clone(),
                synthesizer.clone(),
                fx.artifact_store.clone(),
            )
            .await;
        }

        assert_eq!(fx.ledger.balance(fx.account_id).await.unwrap(), 70);
        let usage_count = fx
            .ledger
            .entries(fx.account_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.kind == TransactionKind::Usage)
            .count();
        assert_eq!(usage_count, 1);
    }

    #[tokio::test]
    async fn test_synthesis_failure_marks_failed_without_charge() {
        let fx = setup(100).await;
        let task_id = submit(&fx, "will fail", 30).await;
        let synthesizer: Arc<dyn SynthesizerPort> = Arc::new(FakeTtsClient::failing("GPU on fire"));

        GenerationWorker::process_task(
            task_id,
            fx.task_store.clone(),
            fx.ledger.clone(),
            fx.voice_catalog.clone(),
            synthesizer,
            fx.artifact_store.clone(),
        )
        .await;

        let task = fx.task_store.get(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, crate::domain::TaskStatus::Failed);
        assert!(task.error_message.as_deref().unwrap().contains("GPU on fire"));
        assert!(task.audio_path.is_none());

        assert_eq!(fx.ledger.balance(fx.account_id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_missing_voice_marks_failed() {
        let fx = setup(100).await;
        let task_id = fx
            .task_store
            .create(NewTask {
                account_id: Some(fx.account_id),
                text: "orphan".to_string(),
                voice_id: Uuid::new_v4(),
                estimated_secs: 60,
                credits_used: 10,
            })
            .await
            .unwrap()
            .id;
        let synthesizer: Arc<dyn SynthesizerPort> =
            Arc::new(FakeTtsClient::new(b"RIFF".to_vec(), None));

        GenerationWorker::process_task(
            task_id,
            fx.task_store.clone(),
            fx.ledger.clone(),
            fx.voice_catalog.clone(),
            synthesizer,
            fx.artifact_store.clone(),
        )
        .await;

        let task = fx.task_store.get(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, crate::domain::TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("Voice not found"));
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_task_completed() {
        // 提交后余额被其他任务花光：任务仍完成，只是欠费待对账
        let fx = setup(10).await;
        let task_id = submit(&fx, "expensive", 50).await;
        let synthesizer: Arc<dyn SynthesizerPort> =
            Arc::new(FakeTtsClient::new(b"RIFFdata".to_vec(), None));

        GenerationWorker::process_task(
            task_id,
            fx.task_store.clone(),
            fx.ledger.clone(),
            fx.voice_catalog.clone(),
            synthesizer,
            fx.artifact_store.clone(),
        )
        .await;

        let task = fx.task_store.get(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, crate::domain::TaskStatus::Completed);
        assert_eq!(fx.ledger.balance(fx.account_id).await.unwrap(), 10);
    }
}
