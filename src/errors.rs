use std::fmt;

#[derive(Debug, Clone)]
pub enum TaplinkerError {
    CacheConnection(String),
    CacheWrite(String),
    FastStore(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
}

impl TaplinkerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TaplinkerError::CacheConnection(_) => "E001",
            TaplinkerError::CacheWrite(_) => "E002",
            TaplinkerError::FastStore(_) => "E003",
            TaplinkerError::DatabaseConfig(_) => "E004",
            TaplinkerError::DatabaseConnection(_) => "E005",
            TaplinkerError::DatabaseOperation(_) => "E006",
            TaplinkerError::FileOperation(_) => "E007",
            TaplinkerError::Validation(_) => "E008",
            TaplinkerError::NotFound(_) => "E009",
            TaplinkerError::Serialization(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TaplinkerError::CacheConnection(_) => "Cache Connection Error",
            TaplinkerError::CacheWrite(_) => "Cache Write Error",
            TaplinkerError::FastStore(_) => "Fast Store Error",
            TaplinkerError::DatabaseConfig(_) => "Database Configuration Error",
            TaplinkerError::DatabaseConnection(_) => "Database Connection Error",
            TaplinkerError::DatabaseOperation(_) => "Database Operation Error",
            TaplinkerError::FileOperation(_) => "File Operation Error",
            TaplinkerError::Validation(_) => "Validation Error",
            TaplinkerError::NotFound(_) => "Resource Not Found",
            TaplinkerError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TaplinkerError::CacheConnection(msg)
            | TaplinkerError::CacheWrite(msg)
            | TaplinkerError::FastStore(msg)
            | TaplinkerError::DatabaseConfig(msg)
            | TaplinkerError::DatabaseConnection(msg)
            | TaplinkerError::DatabaseOperation(msg)
            | TaplinkerError::FileOperation(msg)
            | TaplinkerError::Validation(msg)
            | TaplinkerError::NotFound(msg)
            | TaplinkerError::Serialization(msg) => msg,
        }
    }

    /// 格式化为彩色输出（命令行退出时）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TaplinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TaplinkerError {}

// 便捷的构造函数
impl TaplinkerError {
    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::CacheConnection(msg.into())
    }

    pub fn cache_write<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::CacheWrite(msg.into())
    }

    pub fn fast_store<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::FastStore(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TaplinkerError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for TaplinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        TaplinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<redis::RedisError> for TaplinkerError {
    fn from(err: redis::RedisError) -> Self {
        TaplinkerError::CacheConnection(err.to_string())
    }
}

impl From<std::io::Error> for TaplinkerError {
    fn from(err: std::io::Error) -> Self {
        TaplinkerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TaplinkerError {
    fn from(err: serde_json::Error) -> Self {
        TaplinkerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaplinkerError>;
