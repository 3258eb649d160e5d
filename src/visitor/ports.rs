//! 访客识别依赖的外部协作者
//!
//! - `VisitorStore`: 访客表的读写
//! - `CookiePort`: 读取请求 cookie、写出响应 cookie
//! - `CampaignTagSource`: 请求早期捕获的 UTM 参数

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::codec::TokenCodec;
use crate::config::SameSitePolicy;
use crate::errors::Result;
use crate::storage::models::{Attribution, NewVisitor, VisitorRecord, storage_timestamp};

use super::resolver::token_for;

/// 调用来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Invocation {
    #[default]
    Http,
    Cli,
}

/// 一次请求中与访客识别相关的上下文
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub invocation: Invocation,
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
    pub request_uri: Option<String>,
    pub http_referer: Option<String>,
    pub remote_port: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn http() -> Self {
        Self::default()
    }

    pub fn cli() -> Self {
        Self {
            invocation: Invocation::Cli,
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.http_referer = Some(referer.into());
        self
    }

    /// 生成新访客的插入数据
    pub fn new_visitor(&self, attribution: Attribution, now: DateTime<Utc>) -> NewVisitor {
        NewVisitor {
            ip_address: self.ip_address.clone(),
            hostname: self.hostname.clone(),
            request_uri: self.request_uri.clone(),
            http_referer: self.http_referer.clone(),
            remote_port: self.remote_port.clone(),
            user_agent: self.user_agent.clone(),
            attribution: attribution.truncated(),
            created: storage_timestamp(now),
        }
    }
}

/// 访客表持久化端口
///
/// 每个方法对并发调用方都应是原子的。"不存在"用 `Ok(None)` 表示，
/// `Err` 只用于后端故障。
#[async_trait]
pub trait VisitorStore: Send + Sync {
    fn backend_name(&self) -> &str;

    /// id 与 token 必须同时精确匹配
    async fn find_by_id_and_token(
        &self,
        visitor_id: i64,
        token: &str,
    ) -> Result<Option<VisitorRecord>>;

    /// 插入新访客（token 为空），返回后端生成的 id
    async fn insert(&self, visitor: &NewVisitor) -> Result<i64>;

    async fn set_token(&self, visitor_id: i64, token: &str) -> Result<()>;

    /// 记录一次访问：`last_visit = at`，`visits_count + 1`
    async fn touch_last_visit(&self, visitor_id: i64, at: DateTime<Utc>) -> Result<()>;

    async fn fetch_by_id(&self, visitor_id: i64) -> Result<Option<VisitorRecord>>;

    async fn count(&self) -> Result<u64>;

    /// 关闭底层连接，进程退出前调用
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// 两阶段创建：插入拿到 id，再回填由 id 派生的 token
    ///
    /// 默认实现两步之间没有原子性，支持事务的后端应覆盖。
    async fn create_visitor(
        &self,
        visitor: NewVisitor,
        codec: &TokenCodec,
    ) -> Result<VisitorRecord> {
        let visitor_id = self.insert(&visitor).await?;
        let token = token_for(codec, visitor_id)?;
        self.set_token(visitor_id, &token).await?;
        Ok(visitor.into_record(visitor_id, Some(token)))
    }
}

/// 待写出的 cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCookie {
    pub name: String,
    pub value: String,
    pub max_age: chrono::Duration,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSitePolicy>,
}

/// Cookie 读写端口
pub trait CookiePort: Send + Sync {
    fn read(&self, name: &str) -> Option<String>;

    fn write(&self, cookie: OutgoingCookie) -> Result<()>;
}

/// UTM 参数名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum UtmKey {
    Source,
    Medium,
    Campaign,
    Term,
    Content,
}

impl UtmKey {
    /// 查询参数名，如 `utm_source`
    pub fn param_name(&self) -> String {
        format!("utm_{}", self.as_ref())
    }

    pub fn from_param(name: &str) -> Option<Self> {
        let key = name.strip_prefix("utm_")?;
        Self::iter().find(|k| k.as_ref() == key)
    }
}

/// UTM 归因来源（只读）
pub trait CampaignTagSource: Send + Sync {
    fn get(&self, key: UtmKey) -> Option<String>;

    fn attribution(&self) -> Attribution {
        Attribution {
            utm_source: self.get(UtmKey::Source),
            utm_medium: self.get(UtmKey::Medium),
            utm_campaign: self.get(UtmKey::Campaign),
            utm_term: self.get(UtmKey::Term),
            utm_content: self.get(UtmKey::Content),
        }
    }
}

/// 没有任何 UTM 数据的来源（CLI、测试）
pub struct NoCampaign;

impl CampaignTagSource for NoCampaign {
    fn get(&self, _key: UtmKey) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<UtmKey, String>);

    impl CampaignTagSource for MapSource {
        fn get(&self, key: UtmKey) -> Option<String> {
            self.0.get(&key).cloned()
        }
    }

    #[test]
    fn test_utm_param_names() {
        assert_eq!(UtmKey::Source.param_name(), "utm_source");
        assert_eq!(UtmKey::Content.param_name(), "utm_content");
        assert_eq!(UtmKey::from_param("utm_campaign"), Some(UtmKey::Campaign));
        assert_eq!(UtmKey::from_param("campaign"), None);
        assert_eq!(UtmKey::from_param("utm_id"), None);
    }

    #[test]
    fn test_attribution_snapshot() {
        let source = MapSource(HashMap::from([
            (UtmKey::Source, "newsletter".to_string()),
            (UtmKey::Term, "rust".to_string()),
        ]));
        let attribution = source.attribution();
        assert_eq!(attribution.utm_source.as_deref(), Some("newsletter"));
        assert_eq!(attribution.utm_term.as_deref(), Some("rust"));
        assert_eq!(attribution.utm_medium, None);
        assert_eq!(NoCampaign.attribution(), Attribution::default());
    }

    #[test]
    fn test_new_visitor_copies_context() {
        let ctx = RequestContext::http()
            .with_ip("203.0.113.7")
            .with_user_agent("Mozilla/5.0")
            .with_request_uri("/landing?utm_source=x");
        let now = Utc::now();
        let new = ctx.new_visitor(Attribution::default(), now);
        assert_eq!(new.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(new.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(new.created, storage_timestamp(now));
    }
}
