use std::fmt;

#[derive(Debug, Clone)]
pub enum VisitrackError {
    Config(String),
    Codec(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
}

impl VisitrackError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            VisitrackError::Config(_) => "E001",
            VisitrackError::Codec(_) => "E002",
            VisitrackError::DatabaseConfig(_) => "E003",
            VisitrackError::DatabaseConnection(_) => "E004",
            VisitrackError::DatabaseOperation(_) => "E005",
            VisitrackError::FileOperation(_) => "E006",
            VisitrackError::Validation(_) => "E007",
            VisitrackError::NotFound(_) => "E008",
            VisitrackError::Serialization(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            VisitrackError::Config(_) => "Configuration Error",
            VisitrackError::Codec(_) => "Token Codec Error",
            VisitrackError::DatabaseConfig(_) => "Database Configuration Error",
            VisitrackError::DatabaseConnection(_) => "Database Connection Error",
            VisitrackError::DatabaseOperation(_) => "Database Operation Error",
            VisitrackError::FileOperation(_) => "File Operation Error",
            VisitrackError::Validation(_) => "Validation Error",
            VisitrackError::NotFound(_) => "Resource Not Found",
            VisitrackError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            VisitrackError::Config(msg) => msg,
            VisitrackError::Codec(msg) => msg,
            VisitrackError::DatabaseConfig(msg) => msg,
            VisitrackError::DatabaseConnection(msg) => msg,
            VisitrackError::DatabaseOperation(msg) => msg,
            VisitrackError::FileOperation(msg) => msg,
            VisitrackError::Validation(msg) => msg,
            VisitrackError::NotFound(msg) => msg,
            VisitrackError::Serialization(msg) => msg,
        }
    }

    /// 是否为持久化层故障（调用方应视为访客记录可能缺失或不一致）
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            VisitrackError::DatabaseConnection(_) | VisitrackError::DatabaseOperation(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
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

impl fmt::Display for VisitrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for VisitrackError {}

// 便捷的构造函数
impl VisitrackError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Config(msg.into())
    }

    pub fn codec<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Codec(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        VisitrackError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        VisitrackError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        VisitrackError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        VisitrackError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        VisitrackError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for VisitrackError {
    fn from(err: sea_orm::DbErr) -> Self {
        VisitrackError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for VisitrackError {
    fn from(err: std::io::Error) -> Self {
        VisitrackError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for VisitrackError {
    fn from(err: serde_json::Error) -> Self {
        VisitrackError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VisitrackError>;
