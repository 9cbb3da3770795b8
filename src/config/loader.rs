//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOCALIS_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOCALIS_SERVER__HOST=127.0.0.1`
/// - `VOCALIS_SERVER__PORT=8080`
/// - `VOCALIS_TTS__URL=http://tts-server:8000`
/// - `VOCALIS_CREDITS__FREE_TRIAL_CREDITS=500`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("database.path", "data/vocalis.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.media_dir", "data/media")?
        .set_default("storage.voices_dir", "data/voices")?
        .set_default("credits.calculation_type", "per_character")?
        .set_default("credits.credits_per_unit", 1)?
        .set_default("credits.free_trial_credits", 1000)?
        .set_default("credits.max_text_length", 5000)?
        .set_default("credits.average_task_secs", 30)?
        .set_default("worker.max_concurrent", 2)?
        .set_default("worker.queue_capacity", 1024)?
        .set_default("worker.reaper.enabled", true)?
        .set_default("worker.reaper.interval_secs", 60)?
        .set_default("worker.reaper.stale_after_secs", 600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: VOCALIS_
    // 层级分隔符: __ (双下划线)
    // 例如: VOCALIS_TTS__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("VOCALIS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.credits.credits_per_unit <= 0 {
        return Err(ConfigError::ValidationError(
            "credits_per_unit must be positive".to_string(),
        ));
    }

    if config.credits.free_trial_credits < 0 {
        return Err(ConfigError::ValidationError(
            "free_trial_credits cannot be negative".to_string(),
        ));
    }

    if config.worker.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Worker max_concurrent cannot be 0".to_string(),
        ));
    }

    if config.worker.reaper.enabled && config.worker.reaper.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Reaper interval cannot be 0 when reaper is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!(
        "Database Max Connections: {}",
        config.database.max_connections
    );
    tracing::info!("Media Directory: {:?}", config.storage.media_dir);
    tracing::info!(
        "Billing: {} credits per {}",
        config.credits.credits_per_unit,
        config.credits.calculation_type.unit_name()
    );
    tracing::info!("Free Trial Credits: {}", config.credits.free_trial_credits);
    tracing::info!("Worker Concurrency: {}", config.worker.max_concurrent);
    tracing::info!("Reaper Enabled: {}", config.worker.reaper.enabled);
    if config.worker.reaper.enabled {
        tracing::info!("Reaper Interval: {}s", config.worker.reaper.interval_secs);
        tracing::info!("Stale After: {}s", config.worker.reaper.stale_after_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_credits_per_unit() {
        let mut config = AppConfig::default();
        config.credits.credits_per_unit = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.worker.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }
}
