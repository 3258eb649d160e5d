//! 访客身份解析
//!
//! 每个请求的状态转换：
//!
//! ```text
//! Bot ─────────────────────────────────────────────→ 无访客
//! NoCookie ──────────────────────────→ 创建 ─→ 写 cookie
//! CookiePresentUnverified ─ 解码失败 ─→ 创建
//!                         ─ 库中 id+token 不匹配 ─→ 创建
//!                         ─ 匹配 ─→ Verified ─→ 刷新 cookie
//! ```
//!
//! `plan` 是不依赖任何 I/O 的纯函数，`VisitorResolver::resolve` 按其结果
//! 访问存储和 cookie，并以 `Resolution` 值返回结果。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use super::bot::BotDetector;
use super::ports::{
    CampaignTagSource, CookiePort, OutgoingCookie, RequestContext, VisitorStore,
};
use super::session::VisitorSession;
use crate::codec::TokenCodec;
use crate::config::{CookieConfig, SameSitePolicy, VisitorConfig};
use crate::errors::{Result, VisitrackError};
use crate::storage::models::VisitorRecord;

/// 解析计划（纯函数结果）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// 非交互客户端：不读 cookie，不建记录
    Bot,
    /// cookie 解码成功，需在库中核对 id + token
    Verify { visitor_id: i64, token: String },
    /// 无 cookie 或 cookie 无法解码
    Create,
}

/// 根据请求上下文和 cookie 决定下一步
///
/// `read_cookie` 只在非爬虫请求时被调用。
pub fn plan<F>(ctx: &RequestContext, read_cookie: F, codec: &TokenCodec, bots: &BotDetector) -> Plan
where
    F: FnOnce() -> Option<String>,
{
    if bots.is_bot(ctx) {
        return Plan::Bot;
    }

    let Some(token) = read_cookie().filter(|t| !t.is_empty()) else {
        return Plan::Create;
    };

    match codec.decode(&token).and_then(|id| i64::try_from(id).ok()) {
        Some(visitor_id) => Plan::Verify { visitor_id, token },
        None => {
            trace!("Visitor cookie could not be decoded, treating as absent");
            Plan::Create
        }
    }
}

/// 由访客 id 生成 token
pub fn token_for(codec: &TokenCodec, visitor_id: i64) -> Result<String> {
    let id = u64::try_from(visitor_id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            VisitrackError::database_operation(format!(
                "Backend generated invalid visitor id: {}",
                visitor_id
            ))
        })?;
    Ok(codec.encode(id))
}

/// 一次解析的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Bot,
    /// cookie 校验通过的已有访客
    Verified(VisitorRecord),
    /// 本次请求新建的访客
    Created(VisitorRecord),
}

impl Resolution {
    pub fn is_bot(&self) -> bool {
        matches!(self, Resolution::Bot)
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }

    pub fn record(&self) -> Option<&VisitorRecord> {
        match self {
            Resolution::Bot => None,
            Resolution::Verified(record) | Resolution::Created(record) => Some(record),
        }
    }

    pub fn visitor_id(&self) -> Option<i64> {
        self.record().map(|r| r.visitor_id)
    }

    pub fn token(&self) -> Option<&str> {
        self.record().and_then(|r| r.token.as_deref())
    }
}

/// 访客 cookie 的写出属性
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub validity: chrono::Duration,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSitePolicy>,
}

impl CookieSettings {
    pub fn from_config(config: &CookieConfig) -> Result<Self> {
        Ok(Self {
            name: config.name.clone(),
            validity: config.validity_duration()?,
            path: config.path.clone(),
            domain: config.domain.clone().filter(|d| !d.is_empty()),
            secure: config.secure,
            http_only: config.http_only,
            same_site: config.same_site,
        })
    }

    /// 每次下发都从当前时刻重新计算完整有效期
    pub fn issue(&self, token: &str) -> OutgoingCookie {
        OutgoingCookie {
            name: self.name.clone(),
            value: token.to_string(),
            max_age: self.validity,
            path: self.path.clone(),
            domain: self.domain.clone(),
            secure: self.secure,
            http_only: self.http_only,
            same_site: self.same_site,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "visitor".to_string(),
            validity: chrono::Duration::days(3650),
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

/// 跨请求共享的解析器：编码器、爬虫规则、cookie 属性和存储
#[derive(Clone)]
pub struct VisitorResolver {
    codec: TokenCodec,
    bots: BotDetector,
    cookie: CookieSettings,
    store: Arc<dyn VisitorStore>,
}

impl VisitorResolver {
    pub fn new(
        codec: TokenCodec,
        bots: BotDetector,
        cookie: CookieSettings,
        store: Arc<dyn VisitorStore>,
    ) -> Self {
        Self {
            codec,
            bots,
            cookie,
            store,
        }
    }

    /// 从配置构建，密钥缺失或有效期非法时立即失败
    pub fn from_config(config: &VisitorConfig, store: Arc<dyn VisitorStore>) -> Result<Self> {
        if config.hashids_key.trim().is_empty() {
            return Err(VisitrackError::config("visitor.hashids_key is required"));
        }
        let codec = TokenCodec::new(&config.hashids_key, config.hashids_min_length)?;
        let bots = BotDetector::new(&config.bot.patterns);
        let cookie = CookieSettings::from_config(&config.cookie)?;
        Ok(Self::new(codec, bots, cookie, store))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn bots(&self) -> &BotDetector {
        &self.bots
    }

    pub fn cookie_settings(&self) -> &CookieSettings {
        &self.cookie
    }

    pub fn store(&self) -> &Arc<dyn VisitorStore> {
        &self.store
    }

    /// 为单个请求创建会话，解析结果在会话内缓存
    pub fn session<'a>(
        &'a self,
        ctx: RequestContext,
        cookies: &'a dyn CookiePort,
        campaign: &'a dyn CampaignTagSource,
    ) -> VisitorSession<'a> {
        VisitorSession::new(self, ctx, cookies, campaign)
    }

    /// 执行一次完整解析
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        cookies: &dyn CookiePort,
        campaign: &dyn CampaignTagSource,
        now: DateTime<Utc>,
    ) -> Result<Resolution> {
        let plan = plan(ctx, || cookies.read(&self.cookie.name), &self.codec, &self.bots);

        let record = match plan {
            Plan::Bot => {
                debug!("Bot request suppressed: {:?}", ctx.user_agent);
                return Ok(Resolution::Bot);
            }
            Plan::Verify { visitor_id, token } => {
                match self.store.find_by_id_and_token(visitor_id, &token).await? {
                    Some(record) => {
                        debug!("Visitor {} verified from cookie", visitor_id);
                        self.issue_cookie(cookies, &token);
                        return Ok(Resolution::Verified(record));
                    }
                    None => {
                        debug!(
                            "Cookie token for visitor {} does not match stored token",
                            visitor_id
                        );
                        self.create(ctx, campaign, now).await?
                    }
                }
            }
            Plan::Create => self.create(ctx, campaign, now).await?,
        };

        if let Some(token) = record.token.as_deref() {
            self.issue_cookie(cookies, token);
        }
        Ok(Resolution::Created(record))
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        campaign: &dyn CampaignTagSource,
        now: DateTime<Utc>,
    ) -> Result<VisitorRecord> {
        let new_visitor = ctx.new_visitor(campaign.attribution(), now);
        let record = self.store.create_visitor(new_visitor, &self.codec).await?;
        debug!(
            "Created visitor {} ({} backend)",
            record.visitor_id,
            self.store.backend_name()
        );
        Ok(record)
    }

    /// cookie 写失败不影响解析结果
    fn issue_cookie(&self, cookies: &dyn CookiePort, token: &str) {
        if let Err(e) = cookies.write(self.cookie.issue(token)) {
            warn!("Failed to write visitor cookie: {}", e);
        }
    }
}
