use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumMessage};

use crate::errors::{Result, VisitrackError};
use crate::utils::TimeParser;

/// Cookie SameSite 策略
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr, EnumMessage,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum SameSitePolicy {
    #[strum(message = "Most secure, only same-site requests carry cookies")]
    Strict,
    #[strum(message = "Allows top-level navigation to carry cookies")]
    Lax,
    #[strum(message = "No restrictions, requires Secure attribute")]
    None,
}

impl std::fmt::Display for SameSitePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

impl std::str::FromStr for SameSitePolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Invalid SameSite policy: '{}'. Valid: Strict, Lax, None",
                s
            )),
        }
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - database: 数据库连接与访客表名
/// - visitor: hashids 密钥、访客 cookie、爬虫识别、UTM cookie
/// - proxy: 可信反向代理
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub visitor: VisitorConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置，并在返回前完成校验
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：VT，分隔符：__
    /// 示例：VT__VISITOR__HASHIDS_KEY=secret
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or("config.toml");

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 VT，分隔符 __，列表用逗号分隔
            .add_source(
                Environment::with_prefix("VT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("proxy.trusted_proxies")
                    .with_list_parse_key("visitor.bot.patterns"),
            );

        let settings = builder
            .build()
            .map_err(|e| VisitrackError::config(format!("Failed to build config: {}", e)))?;
        let config = settings
            .try_deserialize::<StaticConfig>()
            .map_err(|e| VisitrackError::config(format!("Failed to deserialize config: {}", e)))?;

        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }

        super::validators::validate_static_config(&config)?;
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.visitor.hashids_key = "change-me".to_string();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VisitrackError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
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
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `memory` 使用进程内存储，其余按 URL 推断 SQLite / MySQL / PostgreSQL
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// 访客表名，支持 `schema.table`
    #[serde(default = "default_table_name")]
    pub table_name: String,
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

/// 访客识别配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorConfig {
    /// token 编码密钥，更换后所有已下发的 cookie 失效
    #[serde(default)]
    pub hashids_key: String,
    #[serde(default = "default_hashids_min_length")]
    pub hashids_min_length: usize,
    #[serde(default)]
    pub cookie: CookieConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub utm: UtmConfig,
}

/// cookie 有效期上限（100 年）
pub const MAX_COOKIE_VALIDITY_DAYS: i64 = 100 * 365;

fn parse_validity(field: &str, value: &str) -> Result<chrono::Duration> {
    let duration = TimeParser::parse_interval(value)
        .map_err(|e| VisitrackError::config(format!("{} '{}': {}", field, value, e)))?;
    if duration > chrono::Duration::days(MAX_COOKIE_VALIDITY_DAYS) {
        return Err(VisitrackError::config(format!(
            "{} '{}' exceeds the maximum of {} days",
            field, value, MAX_COOKIE_VALIDITY_DAYS
        )));
    }
    Ok(duration)
}

/// 访客 cookie 属性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    /// 有效期，支持 `10y`、`1d12h`、`P10Y` 等写法
    #[serde(default = "default_cookie_validity")]
    pub validity: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// 未设置时不输出 SameSite 属性，由浏览器决定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSitePolicy>,
}

impl CookieConfig {
    pub fn validity_duration(&self) -> Result<chrono::Duration> {
        parse_validity("visitor.cookie.validity", &self.validity)
    }
}

/// 爬虫识别配置（User-Agent 子串，大小写不敏感）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_patterns")]
    pub patterns: Vec<String>,
}

/// UTM 参数 cookie 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtmConfig {
    #[serde(default = "default_utm_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_utm_validity")]
    pub validity: String,
}

impl UtmConfig {
    pub fn validity_duration(&self) -> Result<chrono::Duration> {
        parse_validity("visitor.utm.validity", &self.validity)
    }
}

/// 反向代理配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxyConfig {
    /// 可信代理 IP 或 CIDR，为空时对私有地址自动信任转发头
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
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
    "visitrack.db".to_string()
}

fn default_table_name() -> String {
    migration::schema::DEFAULT_VISITOR_TABLE.to_string()
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

fn default_hashids_min_length() -> usize {
    crate::codec::DEFAULT_MIN_LENGTH
}

fn default_cookie_name() -> String {
    "visitor".to_string()
}

fn default_cookie_validity() -> String {
    "10y".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

pub fn default_bot_patterns() -> Vec<String> {
    [
        "bot",
        "crawl",
        "slurp",
        "spider",
        "curl",
        "facebook",
        "fetch",
        "mediapartner",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_utm_cookie_name() -> String {
    "utm".to_string()
}

fn default_utm_validity() -> String {
    "7d".to_string()
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
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            table_name: default_table_name(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            hashids_key: String::new(),
            hashids_min_length: default_hashids_min_length(),
            cookie: CookieConfig::default(),
            bot: BotConfig::default(),
            utm: UtmConfig::default(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            validity: default_cookie_validity(),
            path: default_cookie_path(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            patterns: default_bot_patterns(),
        }
    }
}

impl Default for UtmConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_utm_cookie_name(),
            validity: default_utm_validity(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_same_site_round_trip() {
        for policy in SameSitePolicy::iter() {
            let parsed: SameSitePolicy = policy.to_string().parse().unwrap();
            assert_eq!(parsed, policy);
            assert!(policy.get_message().is_some());
        }
        assert_eq!("strict".parse::<SameSitePolicy>(), Ok(SameSitePolicy::Strict));
        assert!("sometimes".parse::<SameSitePolicy>().is_err());
    }

    #[test]
    fn test_defaults_match_cookie_protocol() {
        let config = StaticConfig::default();
        assert_eq!(config.visitor.cookie.name, "visitor");
        assert_eq!(config.visitor.cookie.path, "/");
        assert_eq!(config.visitor.cookie.domain, None);
        assert!(!config.visitor.cookie.secure);
        assert!(!config.visitor.cookie.http_only);
        assert_eq!(config.visitor.cookie.same_site, None);
        assert_eq!(
            config.visitor.cookie.validity_duration().unwrap(),
            chrono::Duration::days(3650)
        );
        assert_eq!(config.visitor.hashids_min_length, 16);
        assert_eq!(config.visitor.bot.patterns.len(), 8);
        assert_eq!(config.database.table_name, "visitor");
    }

    #[test]
    fn test_sample_config_parses_back() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.visitor.hashids_key, "change-me");
        assert_eq!(parsed.visitor.utm.cookie_name, "utm");
    }
}
