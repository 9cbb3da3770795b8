//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::CreditCalculation;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 合成服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 计费配置
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Worker 配置
    #[serde(default)]
    pub worker: WorkerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 合成服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/vocalis.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 生成音频存储目录
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// 音色参考音频存储目录
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("data/media")
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("data/voices")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            voices_dir: default_voices_dir(),
        }
    }
}

/// 计费配置
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsConfig {
    /// 计费单位模式: per_character / per_word / per_letter
    #[serde(default)]
    pub calculation_type: CreditCalculation,

    /// 每单位消耗的信用点
    #[serde(default = "default_credits_per_unit")]
    pub credits_per_unit: i64,

    /// 新账户赠送的信用点
    #[serde(default = "default_free_trial_credits")]
    pub free_trial_credits: i64,

    /// 单次提交的最大文本长度（字符）
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// 估算排队等待用的平均任务耗时（秒）
    #[serde(default = "default_average_task_secs")]
    pub average_task_secs: i64,
}

fn default_credits_per_unit() -> i64 {
    1
}

fn default_free_trial_credits() -> i64 {
    1000
}

fn default_max_text_length() -> usize {
    5000
}

fn default_average_task_secs() -> i64 {
    30
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            calculation_type: CreditCalculation::default(),
            credits_per_unit: default_credits_per_unit(),
            free_trial_credits: default_free_trial_credits(),
            max_text_length: default_max_text_length(),
            average_task_secs: default_average_task_secs(),
        }
    }
}

/// Worker 配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// 最大并发合成数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 任务派发队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 超时任务回收配置
    #[serde(default)]
    pub reaper: ReaperSettings,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            reaper: ReaperSettings::default(),
        }
    }
}

/// 超时任务回收配置
#[derive(Debug, Clone, Deserialize)]
pub struct ReaperSettings {
    /// 是否启用回收
    #[serde(default = "default_reaper_enabled")]
    pub enabled: bool,

    /// 扫描间隔（秒）
    #[serde(default = "default_reaper_interval")]
    pub interval_secs: u64,

    /// processing 超过该时长视为失联（秒）
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: i64,
}

fn default_reaper_enabled() -> bool {
    true
}

fn default_reaper_interval() -> u64 {
    60
}

fn default_stale_after() -> i64 {
    600
}

impl Default for ReaperSettings {
    fn default() -> Self {
        Self {
            enabled: default_reaper_enabled(),
            interval_secs: default_reaper_interval(),
            stale_after_secs: default_stale_after(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.tts.url, "http://localhost:8000");
        assert_eq!(config.database.path, "data/vocalis.db");
        assert_eq!(config.credits.free_trial_credits, 1000);
        assert_eq!(config.credits.credits_per_unit, 1);
        assert_eq!(config.worker.max_concurrent, 2);
        assert!(config.worker.reaper.enabled);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_url(), "sqlite:data/vocalis.db?mode=rwc");
    }
}
