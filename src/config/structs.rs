use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量、可信代理
/// - database: 数据库连接配置
/// - edge_cache: 重定向映射缓存（band code → 目标）
/// - fast_store: 计数器与待处理点击队列
/// - redirect: 边缘重定向路由与兜底 URL
/// - scheduler: 窗口定时巡检
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub edge_cache: EdgeCacheConfig,
    #[serde(default)]
    pub fast_store: FastStoreConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：TL，分隔符：__
    /// 示例：TL__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 TL，分隔符 __
            .add_source(
                Environment::with_prefix("TL")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.edge_cache.redis_url = Some(default_redis_url());
        sample_config.fast_store.redis_url = Some(default_redis_url());
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 可信代理（IP 或 CIDR），匹配时才采信 X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 边缘缓存配置
///
/// `redis_url` 为空时缓存视为未配置，同步与清除操作直接跳过。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCacheConfig {
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_edge_key_prefix")]
    pub key_prefix: String,
}

/// 快速存储配置（计数器 + 待处理队列）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastStoreConfig {
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_fast_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_queue_key")]
    pub queue_key: String,
    #[serde(default = "default_velocity_ttl_secs")]
    pub velocity_ttl_secs: u64,
}

/// 重定向配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// 部署级兜底 URL（缓存无条目时使用）
    #[serde(default = "default_default_url")]
    pub default_url: String,
    #[serde(default = "default_redirect_path")]
    pub path: String,
}

/// 窗口巡检配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://taplinker.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_edge_key_prefix() -> String {
    "taplinker:band:".to_string()
}

fn default_fast_key_prefix() -> String {
    "taplinker:".to_string()
}

fn default_queue_key() -> String {
    "taps:pending".to_string()
}

fn default_velocity_ttl_secs() -> u64 {
    1800
}

fn default_default_url() -> String {
    "https://example.com/".to_string()
}

fn default_redirect_path() -> String {
    "/e".to_string()
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for EdgeCacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_edge_key_prefix(),
        }
    }
}

impl Default for FastStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_fast_key_prefix(),
            queue_key: default_queue_key(),
            velocity_ttl_secs: default_velocity_ttl_secs(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            default_url: default_default_url(),
            path: default_redirect_path(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
