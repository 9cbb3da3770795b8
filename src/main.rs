//! Vocalis - 语音克隆生成服务
//!
//! - Domain: credits/, task/
//! - Application: commands, queries, ports
//! - Infrastructure: http, worker, persistence, adapters

use std::sync::Arc;

use tokio::sync::mpsc;
use vocalis::config::{load_config, print_config};
use vocalis::domain::CreditPolicy;
use vocalis::infrastructure::adapters::{FileArtifactStore, HttpTtsClient, HttpTtsClientConfig};
use vocalis::infrastructure::http::{AppState, BusinessRules, HttpServer, ServerConfig};
use vocalis::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteLedgerStore, SqliteTaskStore,
    SqliteVoiceRepository,
};
use vocalis::infrastructure::worker::{
    GenerationWorker, GenerationWorkerConfig, ReaperConfig, StaleTaskReaper,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},vocalis={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Vocalis - 语音克隆生成服务");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.media_dir).await?;
    tokio::fs::create_dir_all(&config.storage.voices_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 任务派发队列
    let (queue_tx, queue_rx) = mpsc::channel(config.worker.queue_capacity);

    // 创建存储适配器
    let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
    let task_store = Arc::new(SqliteTaskStore::new(pool.clone(), queue_tx));
    let voice_catalog = Arc::new(SqliteVoiceRepository::new(pool));

    // 创建 HTTP 合成客户端
    let tts_config = HttpTtsClientConfig {
        base_url: config.tts.url.clone(),
        timeout_secs: config.tts.timeout_secs,
    };
    let synthesizer = Arc::new(
        HttpTtsClient::new(tts_config).map_err(|e| anyhow::anyhow!("TTS client: {}", e))?,
    );

    // 创建产物存储
    let artifact_store = Arc::new(
        FileArtifactStore::new(&config.storage.media_dir)
            .await
            .map_err(|e| anyhow::anyhow!("Artifact store: {}", e))?,
    );

    // 重启恢复：重新派发所有 pending 任务
    use vocalis::application::ports::TaskStorePort;
    let requeued = task_store
        .enqueue_pending()
        .await
        .map_err(|e| anyhow::anyhow!("Startup requeue: {}", e))?;
    if requeued > 0 {
        tracing::info!(count = requeued, "Requeued pending tasks from last run");
    }

    // 启动 GenerationWorker
    let worker = GenerationWorker::new(
        GenerationWorkerConfig {
            max_concurrent: config.worker.max_concurrent,
        },
        queue_rx,
        task_store.clone(),
        ledger.clone(),
        voice_catalog.clone(),
        synthesizer,
        artifact_store,
    );
    tokio::spawn(worker.run());

    // 启动 StaleTaskReaper
    if config.worker.reaper.enabled {
        let reaper = StaleTaskReaper::new(
            ReaperConfig {
                interval_secs: config.worker.reaper.interval_secs,
                stale_after_secs: config.worker.reaper.stale_after_secs,
            },
            task_store.clone(),
        );
        tokio::spawn(reaper.run());
    }

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let rules = BusinessRules {
        policy: CreditPolicy {
            calculation: config.credits.calculation_type,
            credits_per_unit: config.credits.credits_per_unit,
        },
        free_trial_credits: config.credits.free_trial_credits,
        max_text_length: config.credits.max_text_length,
        average_task_secs: config.credits.average_task_secs,
    };
    let state = AppState::new(ledger, task_store, voice_catalog, rules);

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
